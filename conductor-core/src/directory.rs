//! Registration directory: component discovery, shared utilities, events.
//!
//! One [`Directory`] is constructed per suite and handed to the loader and to
//! every activated component. Cloning a `Directory` clones the handle, not the
//! contents.
//!
//! Read operations never fail. A missing component or utility is reported as
//! `None`/`false` and the caller decides whether to warn, degrade or abort.
//!
//! Event delivery is synchronous and follows subscription order. The
//! subscriber list is copied before delivery so callbacks may subscribe or
//! unsubscribe while an event is being emitted.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::{ComponentApi, Utility};
use crate::error::DirectoryError;
use crate::types::{ComponentId, ComponentMetadata, RegistryMetadata};

/// Error a subscriber callback may return; it is logged, never propagated.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

type EventCallback = Arc<dyn Fn(&Value) -> Result<(), SubscriberError> + Send + Sync>;

/// A published component.
#[derive(Clone)]
pub struct RegistryEntry {
    pub id: ComponentId,
    pub api: Arc<dyn ComponentApi>,
    pub metadata: RegistryMetadata,
    sequence: u64,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Point-in-time copy of the directory contents, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStatus {
    /// Component ids in registration order.
    pub components: Vec<String>,
    pub utilities: Vec<String>,
    /// Event names with at least one live subscriber.
    pub events: Vec<String>,
}

#[derive(Clone)]
struct Subscriber {
    id: u64,
    callback: EventCallback,
}

#[derive(Default)]
struct State {
    entries: HashMap<ComponentId, RegistryEntry>,
    utilities: HashMap<String, Utility>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_subscription: u64,
    next_sequence: u64,
}

#[derive(Default)]
struct Shared {
    state: RwLock<State>,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_subscriber(&self, event: &str, id: u64) -> bool {
        let mut state = self.write();
        let Some(list) = state.subscribers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            state.subscribers.remove(event);
        }
        removed
    }
}

/// Handle returned by [`Directory::on`].
///
/// The subscriber owns this handle. The directory keeps only the callback;
/// the handle holds a weak reference back, so it never keeps a torn-down
/// directory alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    event: String,
    id: u64,
    directory: Weak<Shared>,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Remove the callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        match self.directory.upgrade() {
            Some(shared) => shared.remove_subscriber(&self.event, self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Shared { .. }")
    }
}

/// Process-wide component directory.
#[derive(Clone, Default)]
pub struct Directory {
    shared: Arc<Shared>,
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("status", &self.status())
            .finish()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Publish `api` under `id`, replacing any previous entry for that id.
    ///
    /// Utilities offered through [`ComponentApi::utility_publisher`] are
    /// published alongside. Subscribers of `"<id>:loaded"` are notified once
    /// the entry is visible.
    pub fn register(
        &self,
        id: impl Into<ComponentId>,
        api: Arc<dyn ComponentApi>,
        metadata: ComponentMetadata,
    ) -> Result<(), DirectoryError> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(DirectoryError::EmptyId);
        }

        let metadata = RegistryMetadata::merged(&id, metadata, Utc::now());
        let utilities = api
            .utility_publisher()
            .map(|publisher| publisher.utilities())
            .unwrap_or_default();

        let payload = json!({
            "id": id.as_str(),
            "name": metadata.name,
            "version": metadata.version,
            "dependencies": metadata.dependencies,
            "registered_at": metadata.registered_at.to_rfc3339(),
        });

        // Replaced values are dropped only after the lock is released; an
        // api's `Drop` may call back into the directory.
        let (replaced, _displaced_utilities) = {
            let mut state = self.shared.write();
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            let replaced = state.entries.insert(
                id.clone(),
                RegistryEntry {
                    id: id.clone(),
                    api,
                    metadata,
                    sequence,
                },
            );
            let displaced: Vec<Utility> = utilities
                .into_iter()
                .filter_map(|(name, utility)| state.utilities.insert(name, utility))
                .collect();
            (replaced, displaced)
        };
        if replaced.is_some() {
            tracing::debug!(component = %id, "registry entry replaced");
        } else {
            tracing::debug!(component = %id, "component registered");
        }
        drop(replaced);

        self.emit(&id.loaded_event(), &payload);
        Ok(())
    }

    /// The published interface for `id`, if any.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ComponentApi>> {
        self.shared.read().entries.get(id).map(|e| e.api.clone())
    }

    /// The published interface for `id`, narrowed to `T`. `None` if absent or
    /// of a different type.
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
        self.get(id)?.into_any_arc().downcast::<T>().ok()
    }

    pub fn entry(&self, id: &str) -> Option<RegistryEntry> {
        self.shared.read().entries.get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.shared.read().entries.contains_key(id)
    }

    /// Declared dependencies of `id` that are not currently registered.
    pub fn missing_dependencies(&self, id: &str) -> Vec<String> {
        let state = self.shared.read();
        let Some(entry) = state.entries.get(id) else {
            return vec![];
        };
        entry
            .metadata
            .dependencies
            .iter()
            .filter(|dep| !state.entries.contains_key(dep.as_str()))
            .cloned()
            .collect()
    }

    /// Every entry, oldest registration first.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> =
            self.shared.read().entries.values().cloned().collect();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    pub fn len(&self) -> usize {
        self.shared.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.read().entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Utilities
    // -----------------------------------------------------------------------

    /// Publish a shared helper. Last writer wins.
    pub fn register_utility(&self, name: impl Into<String>, utility: Utility) {
        let name = name.into();
        let previous = self.shared.write().utilities.insert(name.clone(), utility);
        tracing::debug!(utility = %name, replaced = previous.is_some(), "utility registered");
    }

    pub fn get_utility(&self, name: &str) -> Option<Utility> {
        self.shared.read().utilities.get(name).cloned()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Subscribe `callback` to `event`.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Value) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let event = event.into();
        let mut state = self.shared.write();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state
            .subscribers
            .entry(event.clone())
            .or_default()
            .push(Subscriber {
                id,
                callback: Arc::new(callback),
            });
        Subscription {
            event,
            id,
            directory: Arc::downgrade(&self.shared),
        }
    }

    /// Directory-side equivalent of [`Subscription::unsubscribe`].
    pub fn off(&self, subscription: &Subscription) -> bool {
        if !Weak::ptr_eq(&subscription.directory, &Arc::downgrade(&self.shared)) {
            return false;
        }
        self.shared
            .remove_subscriber(&subscription.event, subscription.id)
    }

    /// Deliver `data` to every current subscriber of `event`, in subscription
    /// order. Returns the number of callbacks invoked.
    ///
    /// A callback that returns an error or panics is logged and skipped.
    pub fn emit(&self, event: &str, data: &Value) -> usize {
        let subscribers: Vec<Subscriber> = match self.shared.read().subscribers.get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        for subscriber in &subscribers {
            match catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(data))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(event, error = %err, "event subscriber failed");
                }
                Err(panic) => {
                    tracing::warn!(
                        event,
                        error = %panic_message(panic.as_ref()),
                        "event subscriber panicked",
                    );
                }
            }
        }
        subscribers.len()
    }

    // -----------------------------------------------------------------------
    // Diagnostics and teardown
    // -----------------------------------------------------------------------

    pub fn status(&self) -> DirectoryStatus {
        let state = self.shared.read();

        let mut entries: Vec<&RegistryEntry> = state.entries.values().collect();
        entries.sort_by_key(|e| e.sequence);

        let mut utilities: Vec<String> = state.utilities.keys().cloned().collect();
        utilities.sort();

        let mut events: Vec<String> = state.subscribers.keys().cloned().collect();
        events.sort();

        DirectoryStatus {
            components: entries.iter().map(|e| e.id.0.clone()).collect(),
            utilities,
            events,
        }
    }

    /// Drop every entry, utility and subscriber.
    pub fn clear(&self) {
        let mut state = self.shared.write();
        state.entries.clear();
        state.utilities.clear();
        state.subscribers.clear();
    }
}

/// Text of a caught panic payload, for logging.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Resource ledger with a single reversal operation.
//!
//! Components record every allocation that must be undone on unload
//! (elements, subscriptions, timers, command registrations). Only the tracker
//! performs the reversal, in reverse creation order.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::directory::{panic_message, Subscription};
use crate::error::TrackerError;

type ReleaseFn = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Kind of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Element,
    Subscription,
    Timer,
    Command,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Element => write!(f, "element"),
            ResourceKind::Subscription => write!(f, "subscription"),
            ResourceKind::Timer => write!(f, "timer"),
            ResourceKind::Command => write!(f, "command"),
        }
    }
}

/// One allocation awaiting reversal.
pub enum TrackedResource {
    Element { label: String, remove: ReleaseFn },
    Subscription(Subscription),
    Timer { label: String, cancel: ReleaseFn },
    Command { name: String, unregister: ReleaseFn },
}

impl TrackedResource {
    pub fn element<F>(label: impl Into<String>, remove: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        Self::Element {
            label: label.into(),
            remove: Box::new(remove),
        }
    }

    pub fn timer<F>(label: impl Into<String>, cancel: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        Self::Timer {
            label: label.into(),
            cancel: Box::new(cancel),
        }
    }

    pub fn command<F>(name: impl Into<String>, unregister: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        Self::Command {
            name: name.into(),
            unregister: Box::new(unregister),
        }
    }

    pub fn subscription(subscription: Subscription) -> Self {
        Self::Subscription(subscription)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Element { .. } => ResourceKind::Element,
            Self::Subscription(_) => ResourceKind::Subscription,
            Self::Timer { .. } => ResourceKind::Timer,
            Self::Command { .. } => ResourceKind::Command,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Element { label, .. } | Self::Timer { label, .. } => label,
            Self::Command { name, .. } => name,
            Self::Subscription(sub) => sub.event(),
        }
    }

    fn release(self) -> Result<(), String> {
        match self {
            Self::Element { remove, .. } => remove(),
            Self::Timer { cancel, .. } => cancel(),
            Self::Command { unregister, .. } => unregister(),
            Self::Subscription(sub) => {
                // Already removed (or directory gone) counts as released.
                sub.unsubscribe();
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TrackedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedResource")
            .field("kind", &self.kind())
            .field("label", &self.label())
            .finish()
    }
}

/// Outcome of [`ResourceTracker::release_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    pub released: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Ledger {
    entries: Vec<TrackedResource>,
    releasing: bool,
}

/// Per-suite ledger of allocated-but-not-yet-released resources.
#[derive(Default)]
pub struct ResourceTracker {
    ledger: Mutex<Ledger>,
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("tracked", &self.len())
            .finish()
    }
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `resource` to the ledger.
    ///
    /// While a release is in progress the resource is reversed immediately
    /// instead; the return value is `false` in that case.
    pub fn track(&self, resource: TrackedResource) -> bool {
        let mut ledger = self.lock();
        if ledger.releasing {
            drop(ledger);
            tracing::debug!(
                kind = %resource.kind(),
                label = resource.label(),
                "resource tracked during release; releasing immediately",
            );
            release_one(resource);
            return false;
        }
        ledger.entries.push(resource);
        true
    }

    /// Reverse every tracked resource, newest first, then leave the ledger
    /// empty. Individual failures are logged and counted; they never stop the
    /// drain. Calling this on an empty ledger is a no-op.
    pub fn release_all(&self) -> Result<ReleaseReport, TrackerError> {
        let drained = {
            let mut ledger = self.lock();
            if ledger.releasing {
                return Err(TrackerError::ReentrantRelease);
            }
            ledger.releasing = true;
            std::mem::take(&mut ledger.entries)
        };

        let mut report = ReleaseReport::default();
        for resource in drained.into_iter().rev() {
            if release_one(resource) {
                report.released += 1;
            } else {
                report.failed += 1;
            }
        }

        self.lock().releasing = false;
        if report.released + report.failed > 0 {
            tracing::info!(
                released = report.released,
                failed = report.failed,
                "resource ledger released",
            );
        }
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<ResourceKind, usize> {
        let mut counts = BTreeMap::new();
        for resource in &self.lock().entries {
            *counts.entry(resource.kind()).or_insert(0) += 1;
        }
        counts
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn release_one(resource: TrackedResource) -> bool {
    let kind = resource.kind();
    let label = resource.label().to_string();
    match catch_unwind(AssertUnwindSafe(move || resource.release())) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::warn!(%kind, label = %label, error = %err, "failed to release resource");
            false
        }
        Err(panic) => {
            tracing::warn!(
                %kind,
                label = %label,
                error = %panic_message(panic.as_ref()),
                "resource release panicked",
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn element(log: &Arc<Mutex<Vec<String>>>, label: &str) -> TrackedResource {
        let log = log.clone();
        let name = label.to_string();
        TrackedResource::element(label, move || {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    #[test]
    fn releases_in_reverse_creation_order() {
        let log = recorder();
        let tracker = ResourceTracker::new();
        tracker.track(element(&log, "first"));
        tracker.track(element(&log, "second"));
        tracker.track(element(&log, "third"));

        let report = tracker.release_all().expect("release");
        assert_eq!(report, ReleaseReport { released: 3, failed: 0 });
        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn failing_release_does_not_stop_the_drain() {
        let log = recorder();
        let tracker = ResourceTracker::new();
        tracker.track(element(&log, "kept"));
        tracker.track(TrackedResource::command("open-panel", || {
            Err("command host gone".to_string())
        }));
        tracker.track(TrackedResource::timer("poll", || panic!("timer exploded")));

        let report = tracker.release_all().expect("release");
        assert_eq!(report, ReleaseReport { released: 1, failed: 2 });
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn second_release_is_noop() {
        let log = recorder();
        let tracker = ResourceTracker::new();
        tracker.track(element(&log, "once"));
        tracker.release_all().expect("first release");

        let report = tracker.release_all().expect("second release");
        assert_eq!(report, ReleaseReport::default());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn counts_by_kind_groups_entries() {
        let log = recorder();
        let tracker = ResourceTracker::new();
        tracker.track(element(&log, "a"));
        tracker.track(element(&log, "b"));
        tracker.track(TrackedResource::timer("t", || Ok(())));

        let counts = tracker.counts_by_kind();
        assert_eq!(counts.get(&ResourceKind::Element), Some(&2));
        assert_eq!(counts.get(&ResourceKind::Timer), Some(&1));
        assert_eq!(counts.get(&ResourceKind::Command), None);
    }
}

//! Declarative component scripts.
//!
//! A script is a YAML document describing what a component does when it is
//! activated:
//!
//! ```text
//! name: Notification Center
//! version: 1.4.0
//! requires: [core]              # must already be registered
//! delay_ms: 40                  # asynchronous initialisation
//! register: true                # publish into the directory (default)
//! register_delay_ms: 0          # publish later, from a background task
//! utilities:                    # name -> constant JSON result
//!   notification_count: 3
//! elements: [panel, badge]      # tracked UI elements
//! commands: [open-notifications]
//! timers:
//!   - { label: refresh, every_ms: 60000 }
//! subscribe: ["core:loaded"]
//! emit:
//!   - { event: "notifications:ready", data: { unread: 3 } }
//! fail: "optional error message"
//! ```
//!
//! Every allocation goes through the suite's resource tracker, so teardown
//! reverses it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conductor_core::{ComponentApi, ComponentMetadata, PublishesUtilities, TrackedResource, Utility};
use serde::Deserialize;
use serde_json::Value;

use super::{Activator, ComponentContext, FetchedComponent};
use crate::error::HostError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentScript {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default = "default_register")]
    pub register: bool,
    #[serde(default)]
    pub register_delay_ms: u64,
    #[serde(default)]
    pub utilities: BTreeMap<String, Value>,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub timers: Vec<TimerScript>,
    #[serde(default)]
    pub subscribe: Vec<String>,
    #[serde(default)]
    pub emit: Vec<EmitScript>,
    #[serde(default)]
    pub fail: Option<String>,
}

fn default_register() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimerScript {
    pub label: String,
    pub every_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitScript {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ComponentScript {
    pub fn parse(locator: &str, content: &str) -> Result<Self, HostError> {
        // An empty document is a component that only registers itself.
        if content.trim().is_empty() {
            return Ok(Self {
                register: true,
                ..Self::default()
            });
        }
        serde_yaml::from_str(content).map_err(|source| HostError::Malformed {
            locator: locator.to_string(),
            source,
        })
    }

    fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata {
            name: self.name.clone(),
            version: self.version.clone(),
            dependencies: self.requires.clone(),
        }
    }
}

/// Interface published by a scripted component.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApi {
    utilities: BTreeMap<String, Value>,
}

impl ComponentApi for ScriptedApi {
    fn utility_publisher(&self) -> Option<&dyn PublishesUtilities> {
        Some(self)
    }
}

impl PublishesUtilities for ScriptedApi {
    fn utilities(&self) -> Vec<(String, Utility)> {
        self.utilities
            .iter()
            .map(|(name, value)| (name.clone(), Utility::constant(value.clone())))
            .collect()
    }
}

/// Activates fetched content as a [`ComponentScript`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarativeActivator;

#[async_trait]
impl Activator for DeclarativeActivator {
    async fn activate(
        &self,
        component: FetchedComponent,
        context: ComponentContext,
    ) -> Result<(), HostError> {
        let script = ComponentScript::parse(&component.locator, &component.content)?;
        let id = context.descriptor.id.clone();

        if let Some(message) = script.fail.as_ref() {
            return Err(HostError::Activation(message.clone()));
        }

        for required in &script.requires {
            if !context.directory.has(required) {
                return Err(HostError::MissingDependency(required.clone()));
            }
        }

        if script.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
        }

        allocate_resources(&script, &context);

        if script.register {
            let api = Arc::new(ScriptedApi {
                utilities: script.utilities.clone(),
            });
            if script.register_delay_ms > 0 {
                spawn_delayed_registration(&script, &context, api);
            } else {
                context
                    .directory
                    .register(id.clone(), api, script.metadata())?;
            }
        } else {
            for (name, value) in &script.utilities {
                context
                    .directory
                    .register_utility(name.clone(), Utility::constant(value.clone()));
            }
        }

        for emit in &script.emit {
            let delivered = context.directory.emit(&emit.event, &emit.data);
            tracing::debug!(component = %id, event = %emit.event, delivered, "event emitted");
        }

        Ok(())
    }
}

fn allocate_resources(script: &ComponentScript, context: &ComponentContext) {
    let id = context.descriptor.id.clone();
    let tracker = &context.tracker;

    for element in &script.elements {
        let (owner, label) = (id.clone(), element.clone());
        tracker.track(TrackedResource::element(element.clone(), move || {
            tracing::debug!(component = %owner, element = %label, "element removed");
            Ok(())
        }));
    }

    for command in &script.commands {
        let (owner, name) = (id.clone(), command.clone());
        tracker.track(TrackedResource::command(command.clone(), move || {
            tracing::debug!(component = %owner, command = %name, "command unregistered");
            Ok(())
        }));
    }

    for event in &script.subscribe {
        let owner = id.clone();
        let subscription = context.directory.on(event.clone(), move |data| {
            tracing::debug!(component = %owner, %data, "event received");
            Ok(())
        });
        tracker.track(TrackedResource::subscription(subscription));
    }

    for timer in &script.timers {
        let period = Duration::from_millis(timer.every_ms.max(1));
        let (owner, label) = (id.clone(), timer.label.clone());
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                tracing::trace!(component = %owner, timer = %label, "timer tick");
            }
        });
        tracker.track(TrackedResource::timer(timer.label.clone(), move || {
            handle.abort();
            Ok(())
        }));
    }
}

/// The pending registration is tracked as a timer, so a teardown before the
/// delay elapses cancels it.
fn spawn_delayed_registration(
    script: &ComponentScript,
    context: &ComponentContext,
    api: Arc<ScriptedApi>,
) {
    let delay = Duration::from_millis(script.register_delay_ms);
    let metadata = script.metadata();
    let directory = context.directory.clone();
    let id = context.descriptor.id.clone();
    let label = format!("{id}:register");
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = directory.register(id.clone(), api, metadata) {
            tracing::warn!(component = %id, error = %err, "delayed registration failed");
        }
    });
    context.tracker.track(TrackedResource::timer(label, move || {
        handle.abort();
        Ok(())
    }));
}

//! Domain types for the component suite.
//!
//! Descriptors are immutable once a [`crate::Manifest`] has been built; load
//! and registry records are produced fresh on every run and never persisted.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed component identifier (unique across a manifest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the event emitted when this component registers itself.
    pub fn loaded_event(&self) -> String {
        loaded_event_name(&self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// `"<id>:loaded"`
pub fn loaded_event_name(id: &str) -> String {
    format!("{id}:loaded")
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// One manifest entry: what to load, from where, and how much it matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub id: ComponentId,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Opaque address handed to the retrieval primitive.
    #[serde(rename = "locator")]
    pub retrieval_locator: String,
    #[serde(default)]
    pub critical: bool,
}

impl ComponentDescriptor {
    pub fn new(
        id: impl Into<ComponentId>,
        display_name: impl Into<String>,
        retrieval_locator: impl Into<String>,
        critical: bool,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            retrieval_locator: retrieval_locator.into(),
            critical,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry metadata
// ---------------------------------------------------------------------------

/// Metadata a component supplies when it publishes itself.
///
/// Every field is optional on the way in; the directory fills defaults at
/// publish time (see [`RegistryMetadata`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ComponentMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Default version recorded for components that do not declare one.
pub const DEFAULT_COMPONENT_VERSION: &str = "0.0.0";

/// Metadata as stored in a registry entry, after defaults are merged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl RegistryMetadata {
    /// Merge caller-supplied metadata over the defaults for `id`.
    pub fn merged(id: &ComponentId, supplied: ComponentMetadata, now: DateTime<Utc>) -> Self {
        Self {
            name: supplied.name.unwrap_or_else(|| id.0.clone()),
            version: supplied
                .version
                .unwrap_or_else(|| DEFAULT_COMPONENT_VERSION.to_string()),
            dependencies: supplied.dependencies,
            registered_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

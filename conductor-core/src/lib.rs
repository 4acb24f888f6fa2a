//! Conductor core library: component manifest, registration directory,
//! resource tracker, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, descriptors, registry metadata
//! - [`manifest`]: validated load order + YAML loading
//! - [`directory`]: component discovery, utilities, events
//! - [`tracker`]: allocation ledger and teardown reversal
//! - [`api`]: published-interface capability traits
//! - [`error`]: [`ManifestError`], [`DirectoryError`], [`TrackerError`]

pub mod api;
pub mod directory;
pub mod error;
pub mod manifest;
pub mod tracker;
pub mod types;

pub use api::{ComponentApi, EmptyApi, HasLifecycle, PublishesUtilities, Utility};
pub use directory::{
    panic_message, Directory, DirectoryStatus, RegistryEntry, SubscriberError, Subscription,
};
pub use error::{DirectoryError, ManifestError, TrackerError};
pub use manifest::{LoadedManifest, Manifest, ManifestSettings};
pub use tracker::{ReleaseReport, ResourceKind, ResourceTracker, TrackedResource};
pub use types::{ComponentDescriptor, ComponentId, ComponentMetadata, RegistryMetadata};

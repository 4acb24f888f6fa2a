//! Error types for conductor-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors detected while building a manifest.
///
/// These are fatal at suite startup: no component is retrieved once one of
/// them has been raised.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest YAML file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// A descriptor at `index` has a blank id.
    #[error("component at position {index} has an empty id")]
    EmptyId { index: usize },

    /// Two descriptors share the same id.
    #[error("duplicate component id '{id}' (positions {first} and {second})")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },

    /// A descriptor has a blank retrieval locator.
    #[error("component '{id}' has an empty retrieval locator")]
    EmptyLocator { id: String },
}

/// Misuse of the registration directory's write operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("cannot register a component with an empty id")]
    EmptyId,
}

/// Misuse of the resource tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// `release_all` was invoked from inside a release action.
    #[error("release_all called while a release is already in progress")]
    ReentrantRelease,
}

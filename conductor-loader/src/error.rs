use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the host retrieval and activation primitives.
///
/// The loader converts every one of these into a failed load result; none of
/// them escapes a suite run.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error reading component at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP retrieval of {locator} failed: {message}")]
    Http { locator: String, message: String },

    #[error("malformed component script from {locator}: {source}")]
    Malformed {
        locator: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("activation failed: {0}")]
    Activation(String),

    #[error("required component '{0}' is not registered")]
    MissingDependency(String),

    #[error("registration rejected: {0}")]
    Directory(#[from] conductor_core::DirectoryError),

    #[error("host task join error: {0}")]
    Join(String),
}

/// Error surface for suite construction and the blocking entry point.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("manifest error: {0}")]
    Manifest(#[from] conductor_core::ManifestError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> HostError {
    HostError::Io {
        path: path.into(),
        source,
    }
}

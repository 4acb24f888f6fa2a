//! Suite bootstrap and teardown.
//!
//! A [`Suite`] owns the one directory and the one resource tracker of a
//! process, hands both to the loader and to every activated component, and
//! exposes the teardown entry point.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use conductor_core::{
    manifest, panic_message, ComponentDescriptor, Directory, Manifest, ReleaseReport,
    ResourceTracker,
};
use serde::Serialize;

use crate::config::LoaderConfig;
use crate::error::SuiteError;
use crate::host::Host;
use crate::loader::SequentialLoader;
use crate::progress::ProgressObserver;
use crate::report::SuiteResult;

/// Outcome of [`Suite::teardown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub components_shut_down: usize,
    pub shutdown_failures: usize,
    pub resources: ReleaseReport,
}

pub struct Suite {
    manifest: Manifest,
    directory: Directory,
    tracker: Arc<ResourceTracker>,
    loader: SequentialLoader,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("components", &self.manifest.len())
            .field("registered", &self.directory.len())
            .field("tracked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Validate `descriptors` and wire a suite around them.
    ///
    /// Configuration errors surface here, before anything is retrieved.
    pub fn new(
        descriptors: Vec<ComponentDescriptor>,
        host: Host,
        config: LoaderConfig,
    ) -> Result<Self, SuiteError> {
        Ok(Self::from_manifest(Manifest::new(descriptors)?, host, config))
    }

    pub fn from_manifest(manifest: Manifest, host: Host, config: LoaderConfig) -> Self {
        let directory = Directory::new();
        let tracker = Arc::new(ResourceTracker::new());
        let loader = SequentialLoader::new(directory.clone(), tracker.clone(), host, config);
        Self {
            manifest,
            directory,
            tracker,
            loader,
        }
    }

    /// Load a manifest file and run it with filesystem/HTTP retrieval and
    /// declarative activation. Timings come from the file's `settings`.
    pub fn from_manifest_file(path: &Path) -> Result<Self, SuiteError> {
        let loaded = manifest::load_at(path)?;
        let config = LoaderConfig::from_settings(&loaded.settings);
        Ok(Self::from_manifest(
            loaded.manifest,
            Host::declarative(loaded.base_dir),
            config,
        ))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.loader.add_observer(observer);
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn tracker(&self) -> &Arc<ResourceTracker> {
        &self.tracker
    }

    pub async fn run(&self) -> SuiteResult {
        self.loader.run(&self.manifest).await
    }

    /// Unwind everything the suite allocated.
    ///
    /// Registered components exposing a lifecycle are shut down newest first,
    /// then the resource ledger is released, then the directory is cleared.
    /// Failures and panics are logged and counted; teardown always runs to the
    /// end.
    pub fn teardown(&self) -> TeardownReport {
        let mut report = TeardownReport::default();

        for entry in self.directory.entries().into_iter().rev() {
            let Some(lifecycle) = entry.api.lifecycle() else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| lifecycle.shutdown())) {
                Ok(Ok(())) => report.components_shut_down += 1,
                Ok(Err(err)) => {
                    report.shutdown_failures += 1;
                    tracing::warn!(component = %entry.id, error = %err, "component shutdown failed");
                }
                Err(panic) => {
                    report.shutdown_failures += 1;
                    tracing::warn!(
                        component = %entry.id,
                        error = %panic_message(panic.as_ref()),
                        "component shutdown panicked",
                    );
                }
            }
        }

        report.resources = match self.tracker.release_all() {
            Ok(released) => released,
            Err(err) => {
                tracing::error!(error = %err, "resource release skipped");
                ReleaseReport::default()
            }
        };

        self.directory.clear();
        tracing::info!(
            components_shut_down = report.components_shut_down,
            shutdown_failures = report.shutdown_failures,
            released = report.resources.released,
            release_failures = report.resources.failed,
            "suite torn down",
        );
        report
    }
}

/// Single-threaded runtime: every component shares one logical timeline.
pub fn build_runtime() -> Result<tokio::runtime::Runtime, SuiteError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SuiteError::Runtime)
}

/// Load the manifest at `path`, run it to completion on a fresh runtime and
/// tear it down again.
pub fn run_blocking(
    path: &Path,
    observers: Vec<Arc<dyn ProgressObserver>>,
) -> Result<(SuiteResult, TeardownReport), SuiteError> {
    init_tracing();
    let mut suite = Suite::from_manifest_file(path)?;
    for observer in observers {
        suite = suite.with_observer(observer);
    }
    let runtime = build_runtime()?;
    let result = runtime.block_on(suite.run());
    let teardown = suite.teardown();
    Ok((result, teardown))
}

/// Install the stderr `tracing` subscriber (`RUST_LOG`, default `info`).
/// Later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! `conductor inspect`: run a manifest and dump the directory snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use conductor_core::DirectoryStatus;
use conductor_loader::{build_runtime, init_tracing, Suite, SuiteClassification};
use serde::Serialize;

/// Arguments for `conductor inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the manifest YAML file.
    pub manifest: PathBuf,
}

#[derive(Serialize)]
struct InspectJson {
    classification: SuiteClassification,
    failed: Vec<String>,
    directory: DirectoryStatus,
    tracked_resources: usize,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        init_tracing();

        let suite = Suite::from_manifest_file(&self.manifest)
            .with_context(|| format!("failed to load manifest {}", self.manifest.display()))?;
        let runtime = build_runtime().context("failed to start runtime")?;
        let result = runtime.block_on(suite.run());

        let payload = InspectJson {
            classification: result.classification(),
            failed: result.failed.iter().map(|r| r.id().to_string()).collect(),
            directory: suite.directory().status(),
            tracked_resources: suite.tracker().len(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize inspect JSON")?
        );

        suite.teardown();
        Ok(())
    }
}

//! `conductor run`: load a manifest, stream progress, print the summary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use conductor_loader::{build_runtime, init_tracing, Suite, TeardownReport};
use conductor_reporter::{render_table, to_json, ConsoleReporter};

/// Arguments for `conductor run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the manifest YAML file.
    pub manifest: PathBuf,

    /// Emit a machine-readable JSON summary instead of live progress.
    #[arg(long)]
    pub json: bool,

    /// Leave components and tracked resources in place after the run.
    #[arg(long)]
    pub no_teardown: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        init_tracing();

        let mut suite = Suite::from_manifest_file(&self.manifest)
            .with_context(|| format!("failed to load manifest {}", self.manifest.display()))?;
        if !self.json {
            suite = suite.with_observer(Arc::new(ConsoleReporter::stdout()));
        }

        let runtime = build_runtime().context("failed to start runtime")?;
        let result = runtime.block_on(suite.run());

        if self.json {
            println!("{}", to_json(&result).context("failed to serialize summary JSON")?);
        } else {
            println!();
            println!("{}", render_table(&result));
        }

        if self.no_teardown {
            return Ok(());
        }
        let teardown = suite.teardown();
        if !self.json {
            print_teardown(&teardown);
        }
        Ok(())
    }
}

fn print_teardown(report: &TeardownReport) {
    println!(
        "teardown: {} components shut down ({} failed), {} resources released ({} failed)",
        report.components_shut_down,
        report.shutdown_failures,
        report.resources.released,
        report.resources.failed,
    );
}

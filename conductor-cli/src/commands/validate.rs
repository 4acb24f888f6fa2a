//! `conductor validate`: configuration check without loading anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use conductor_core::manifest;
use conductor_loader::LoaderConfig;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Arguments for `conductor validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the manifest YAML file.
    pub manifest: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "locator")]
    locator: String,
    #[tabled(rename = "critical")]
    critical: &'static str,
}

#[derive(Serialize)]
struct TimingsJson {
    activation_timeout_ms: u128,
    readiness_timeout_ms: u128,
    readiness_poll_ms: u128,
    settle_delay_ms: u128,
}

#[derive(Serialize)]
struct ValidateJson<'a> {
    valid: bool,
    timings: TimingsJson,
    components: &'a [conductor_core::ComponentDescriptor],
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let loaded = manifest::load_at(&self.manifest)
            .with_context(|| format!("invalid manifest {}", self.manifest.display()))?;
        let config = LoaderConfig::from_settings(&loaded.settings);

        if self.json {
            let payload = ValidateJson {
                valid: true,
                timings: TimingsJson {
                    activation_timeout_ms: config.activation_timeout.as_millis(),
                    readiness_timeout_ms: config.readiness_timeout.as_millis(),
                    readiness_poll_ms: config.readiness_poll.as_millis(),
                    settle_delay_ms: config.settle_delay.as_millis(),
                },
                components: loaded.manifest.descriptors(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize manifest JSON")?
            );
            return Ok(());
        }

        println!(
            "{} {} ({} components)",
            "valid".green().bold(),
            self.manifest.display(),
            loaded.manifest.len(),
        );
        println!(
            "timings: activation {} ms | readiness {} ms (poll {} ms) | settle {} ms",
            config.activation_timeout.as_millis(),
            config.readiness_timeout.as_millis(),
            config.readiness_poll.as_millis(),
            config.settle_delay.as_millis(),
        );
        if loaded.manifest.is_empty() {
            return Ok(());
        }

        let rows: Vec<DescriptorRow> = loaded
            .manifest
            .iter()
            .enumerate()
            .map(|(index, d)| DescriptorRow {
                position: index + 1,
                id: d.id.to_string(),
                name: d.display_name.clone(),
                locator: d.retrieval_locator.clone(),
                critical: if d.critical { "yes" } else { "no" },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

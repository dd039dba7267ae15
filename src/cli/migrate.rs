//! Upgrade a snapshot to the current schema.

use crate::cli::common::{load_snapshot, CliError, CliResult};
use crate::store::ConfigStore;
use clap::Args;
use std::path::PathBuf;

/// Migrate a configuration to the current schema version
#[derive(Debug, Clone, Args)]
pub struct MigrateArgs {
    /// Path to configuration JSON
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Write here instead of overwriting the input
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

impl MigrateArgs {
    /// Execute the migrate command
    pub fn execute(&self) -> CliResult<()> {
        let loaded = load_snapshot(&self.config)?;
        let report = &loaded.migration;

        if report.is_noop() {
            println!("✓ Already at version {}", report.to_version);
        } else {
            println!(
                "Migrating {} -> {}",
                report.from_version, report.to_version
            );
            for step in &report.steps {
                println!("  • {step}");
            }
        }

        if self.dry_run {
            return Ok(());
        }

        let target = self.out.as_ref().unwrap_or(&self.config);
        if report.is_noop() && self.out.is_none() {
            return Ok(());
        }

        ConfigStore::new()
            .save(&loaded.config, target)
            .map_err(|e| CliError::from_core("Failed to save configuration", &e))?;
        println!("✓ Wrote {}", target.display());
        Ok(())
    }
}

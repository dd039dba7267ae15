//! Generate command for firmware files.

use crate::cli::common::{CliError, CliResult, Workspace};
use crate::firmware::{FirmwareGenerator, FirmwareValidator};
use crate::keycode_db::KeycodeDb;
use crate::store::{FsSnapshotWriter, SnapshotWriter};
use clap::Args;
use std::path::PathBuf;

/// Generate `code.py` (and `boot.py`) from a configuration snapshot
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Path to configuration JSON
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Output directory (defaults to `paths.output_dir` from settings)
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Hardware profile TOML (defaults to settings, then the Chronos Pad)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Never write boot.py
    #[arg(long)]
    pub no_boot: bool,
}

impl GenerateArgs {
    /// Execute the generate command
    pub fn execute(&self) -> CliResult<()> {
        let workspace = Workspace::open(&self.config, self.profile.as_ref(), self.settings.as_ref())?;

        let keycode_db = KeycodeDb::load()
            .map_err(|e| CliError::io(format!("Failed to load keycode database: {e}")))?;

        // Validate before generating
        let report =
            FirmwareValidator::new(&workspace.config, &workspace.profile, &keycode_db).validate();
        if !report.is_valid() {
            return Err(CliError::validation(format!(
                "Configuration validation failed:\n{}",
                report.format_message()
            )));
        }
        for warning in &report.warnings {
            tracing::warn!("{}", warning.message);
        }

        let generator = FirmwareGenerator::new(&workspace.config, &workspace.profile, &keycode_db);
        let files = generator
            .generate_all()
            .map_err(|e| CliError::from_core("Failed to generate firmware", &e))?;

        let out_dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| workspace.settings.paths.output_dir.clone());
        std::fs::create_dir_all(&out_dir)
            .map_err(|e| CliError::io(format!("Failed to create output directory: {e}")))?;

        let writer = FsSnapshotWriter;
        writer
            .write_atomic(&out_dir.join("code.py"), files.code_py.as_bytes())
            .map_err(|e| CliError::from_core("Failed to write code.py", &e))?;
        let mut written = vec!["code.py"];

        let want_boot = workspace.settings.generate.boot_py && !self.no_boot;
        if let (true, Some(boot_py)) = (want_boot, &files.boot_py) {
            writer
                .write_atomic(&out_dir.join("boot.py"), boot_py.as_bytes())
                .map_err(|e| CliError::from_core("Failed to write boot.py", &e))?;
            written.push("boot.py");
        }

        tracing::info!("Generated {} into {}", written.join(", "), out_dir.display());
        println!("✓ Generated {}", written.join(" and "));
        println!("  Output: {}", out_dir.display());
        if !report.warnings.is_empty() {
            println!("  {} warning(s); run `validate` for details", report.warnings.len());
        }

        Ok(())
    }
}

//! Create a fresh configuration snapshot.

use crate::cli::common::{load_settings, resolve_profile, CliError, CliResult};
use crate::models::Configuration;
use crate::store::ConfigStore;
use clap::Args;
use std::path::PathBuf;

/// Create a new configuration with one empty layer
#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Output file path
    #[arg(value_name = "FILE")]
    pub out: PathBuf,

    /// Hardware profile TOML (defaults to settings, then the Chronos Pad)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Number of layers to start with
    #[arg(long, default_value_t = 1)]
    pub layers: usize,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

impl NewArgs {
    /// Execute the new command
    pub fn execute(&self) -> CliResult<()> {
        if self.layers == 0 {
            return Err(CliError::validation("A configuration needs at least one layer"));
        }
        if self.out.exists() && !self.force {
            return Err(CliError::validation(format!(
                "{} already exists (use --force to overwrite)",
                self.out.display()
            )));
        }

        let settings = load_settings(self.settings.as_ref())?;
        let profile = resolve_profile(self.profile.as_ref(), &settings)?;

        let mut config = Configuration::new(&profile);
        for _ in 1..self.layers {
            config.add_layer();
        }

        ConfigStore::new()
            .save(&config, &self.out)
            .map_err(|e| CliError::from_core("Failed to save configuration", &e))?;

        println!(
            "✓ Created {} ({} layer(s), {}x{} {})",
            self.out.display(),
            config.layer_count(),
            profile.rows,
            profile.cols,
            profile.name
        );
        Ok(())
    }
}

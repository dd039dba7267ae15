//! Show the resolved LED colors of each layer.

use crate::cli::common::{CliError, CliResult, Workspace};
use crate::firmware::ColorResolver;
use crate::models::RgbColor;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Print effective per-key colors after inheritance and overrides
#[derive(Debug, Clone, Args)]
pub struct ColorsArgs {
    /// Path to configuration JSON
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Only this layer
    #[arg(long, value_name = "N")]
    pub layer: Option<usize>,

    /// Physical LED order (as sent to the strip) instead of the key grid
    #[arg(long)]
    pub physical: bool,

    /// Hardware profile TOML (defaults to settings, then the Chronos Pad)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Colors of one layer for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct LayerColorsInfo {
    /// Layer index
    pub layer: usize,
    /// `#RRGGBB` per key (or per LED with `--physical`)
    pub colors: Vec<String>,
}

impl ColorsArgs {
    /// Execute the colors command
    pub fn execute(&self) -> CliResult<()> {
        let workspace = Workspace::open(&self.config, self.profile.as_ref(), self.settings.as_ref())?;
        let config = &workspace.config;

        if let Some(layer) = self.layer {
            if layer >= config.layer_count() {
                return Err(CliError::validation(format!(
                    "Layer {layer} does not exist (have {})",
                    config.layer_count()
                )));
            }
        }

        let led_order = workspace.profile.led_order();
        let resolver = ColorResolver::new(config, &led_order);
        let per_layer: Vec<Vec<RgbColor>> = if self.physical {
            resolver
                .resolve()
                .map(|layers| layers.into_iter().map(|l| l.leds).collect())
        } else {
            resolver.resolve_logical()
        }
        .map_err(|e| CliError::from_core("Failed to resolve colors", &e))?;

        let layers: Vec<LayerColorsInfo> = per_layer
            .into_iter()
            .enumerate()
            .filter(|(index, _)| self.layer.map_or(true, |only| only == *index))
            .map(|(layer, colors)| LayerColorsInfo {
                layer,
                colors: colors.iter().map(RgbColor::to_hex).collect(),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&layers)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
            return Ok(());
        }

        let cols = workspace.profile.cols.max(1);
        for info in &layers {
            println!("Layer {}:", info.layer);
            if self.physical {
                for (led, color) in info.colors.iter().enumerate() {
                    println!("  LED {led:>2}: {color}");
                }
            } else {
                for row in info.colors.chunks(cols) {
                    println!("  {}", row.join(" "));
                }
            }
        }

        Ok(())
    }
}

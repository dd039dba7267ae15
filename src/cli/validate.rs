//! Validation command for configuration snapshots.

use crate::cli::common::{
    CliError, CliResult, ValidationLocation, ValidationMessage, ValidationResponse, Workspace,
};
use crate::firmware::FirmwareValidator;
use crate::keycode_db::KeycodeDb;
use clap::Args;
use std::path::PathBuf;

/// Validate a configuration for errors and warnings
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Path to configuration JSON
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Hardware profile TOML (defaults to settings, then the Chronos Pad)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> CliResult<()> {
        let workspace = Workspace::open(&self.config, self.profile.as_ref(), self.settings.as_ref())?;

        let keycode_db = KeycodeDb::load()
            .map_err(|e| CliError::io(format!("Failed to load keycode database: {e}")))?;

        let report =
            FirmwareValidator::new(&workspace.config, &workspace.profile, &keycode_db).validate();

        let mut messages: Vec<ValidationMessage> = report
            .errors
            .iter()
            .map(|error| ValidationMessage {
                severity: "error".to_string(),
                kind: Some(error.kind.to_string()),
                message: error.message.clone(),
                suggestion: error.suggestion.clone(),
                location: (error.layer.is_some() || error.key.is_some()).then(|| {
                    ValidationLocation {
                        layer: error.layer,
                        key: error.key,
                    }
                }),
            })
            .collect();
        messages.extend(report.warnings.iter().map(|warning| ValidationMessage {
            severity: "warning".to_string(),
            kind: None,
            message: warning.message.clone(),
            suggestion: None,
            location: None,
        }));

        let response = ValidationResponse {
            valid: report.is_valid(),
            messages,
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&response)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else {
            if response.valid {
                println!("✓ Validation passed");
            } else {
                println!("✗ Validation failed");
            }

            if !response.messages.is_empty() {
                println!("\nIssues:");
                for msg in &response.messages {
                    let prefix = if msg.severity == "error" { "  ✗" } else { "  ⚠" };
                    match &msg.location {
                        Some(ValidationLocation {
                            layer: Some(layer),
                            key: Some(key),
                        }) => println!("{prefix} [Layer {layer}, key {key}] {}", msg.message),
                        Some(ValidationLocation {
                            layer: Some(layer),
                            key: None,
                        }) => println!("{prefix} [Layer {layer}] {}", msg.message),
                        _ => println!("{prefix} {}", msg.message),
                    }
                    if let Some(suggestion) = &msg.suggestion {
                        println!("      → {suggestion}");
                    }
                }
            }
        }

        if !response.valid {
            return Err(CliError::validation("Validation failed"));
        }

        if self.strict && !report.warnings.is_empty() {
            return Err(CliError::validation("Warnings found in strict mode"));
        }

        Ok(())
    }
}

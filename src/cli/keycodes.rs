//! List and search the keycode database.

use crate::cli::common::{CliError, CliResult};
use crate::keycode_db::{KeycodeDb, KeycodeDefinition};
use clap::Args;
use serde::Serialize;

/// List KMK keycodes, optionally filtered
#[derive(Debug, Clone, Args)]
pub struct KeycodesArgs {
    /// Search by code, name or description
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Only this category (e.g. "basic", "layers")
    #[arg(long, value_name = "ID")]
    pub category: Option<String>,

    /// Check whether a single token is valid
    #[arg(long, value_name = "TOKEN", conflicts_with_all = ["query", "category"])]
    pub check: Option<String>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Keycode list response for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct KeycodesResponse<'a> {
    /// Matching keycodes
    pub keycodes: Vec<&'a KeycodeDefinition>,
    /// Number of matches
    pub count: usize,
}

impl KeycodesArgs {
    /// Execute the keycodes command
    pub fn execute(&self) -> CliResult<()> {
        let db = KeycodeDb::load()
            .map_err(|e| CliError::io(format!("Failed to load keycode database: {e}")))?;

        if let Some(token) = &self.check {
            let valid = db.is_valid(token);
            if self.json {
                println!("{}", serde_json::json!({ "token": token, "valid": valid }));
            } else if valid {
                println!("✓ {token} is a valid keycode");
            } else {
                println!("✗ {token} is not a recognized keycode");
            }
            return if valid {
                Ok(())
            } else {
                Err(CliError::validation(format!("Unknown keycode: {token}")))
            };
        }

        if let Some(category) = &self.category {
            if db.get_category(category).is_none() {
                let known: Vec<&str> = db.categories().iter().map(|c| c.id.as_str()).collect();
                return Err(CliError::validation(format!(
                    "Unknown category '{category}'. Known: {}",
                    known.join(", ")
                )));
            }
        }

        let keycodes: Vec<&KeycodeDefinition> = db
            .search(self.query.as_deref().unwrap_or(""))
            .into_iter()
            .filter(|k| self.category.as_ref().map_or(true, |c| &k.category == c))
            .collect();

        if self.json {
            let response = KeycodesResponse {
                count: keycodes.len(),
                keycodes,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&response)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
            return Ok(());
        }

        for keycode in &keycodes {
            match &keycode.description {
                Some(description) => {
                    println!("{:<24} {:<20} {description}", keycode.code, keycode.name);
                }
                None => println!("{:<24} {}", keycode.code, keycode.name),
            }
        }
        println!("\n{} keycode(s)", keycodes.len());
        Ok(())
    }
}

//! KmkPad - KMK firmware generator for RP2040 macropads
//!
//! Turns a JSON configuration snapshot into the CircuitPython sources the
//! KMK firmware runs.

use clap::{Parser, Subcommand};
use kmkpad::cli::{
    CliError, ColorsArgs, GenerateArgs, KeycodesArgs, MigrateArgs, NewArgs, ValidateArgs,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// KmkPad - KMK firmware generator for RP2040 macropads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new configuration
    New(NewArgs),
    /// Generate code.py and boot.py
    Generate(GenerateArgs),
    /// Validate a configuration
    Validate(ValidateArgs),
    /// Upgrade a configuration to the current schema
    Migrate(MigrateArgs),
    /// Show resolved per-key colors
    Colors(ColorsArgs),
    /// List or check keycodes
    Keycodes(KeycodesArgs),
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so command output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result: Result<(), CliError> = match &cli.command {
        Command::New(args) => args.execute(),
        Command::Generate(args) => args.execute(),
        Command::Validate(args) => args.execute(),
        Command::Migrate(args) => args.execute(),
        Command::Colors(args) => args.execute(),
        Command::Keycodes(args) => args.execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

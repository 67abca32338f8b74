//! Command line interface for the bibfill ISBN metadata enrichment library.
//!
//! This crate provides the `bibfill` binary on top of the `bibfill` library. It
//! supports:
//! - Writing a starter configuration with editable provider definitions
//! - Looking up a single ISBN
//! - Enriching a whole list of ISBNs and exporting the result tables
//! - Inspecting the configured provider chain
//!
//! # Usage
//!
//! ```bash
//! # Write ~/.config/bibfill/config.toml and the default provider files
//! bibfill init
//!
//! # Look up one book
//! bibfill lookup 978-0-14-312774-1
//!
//! # Enrich a list, one ISBN per row, and write the CSV exports to ./out
//! bibfill batch isbns.csv --output-dir out
//!
//! # Show the provider chain
//! bibfill providers
//! ```
//!
//! Output is colored and destructive operations ask for confirmation. Logging
//! goes to stderr and gets more detailed with each `-v`.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use bibfill::{
  config::Config,
  coordinator::{Coordinator, Progress, Report},
  error::BibfillError,
  fetcher::Fetcher,
  provider::{mask_key, ProviderConfig},
  record::Record,
  table::{self, ExportFiles},
};
use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Enrich ISBN lists with bibliographic metadata")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default
  /// platform-specific config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

impl Cli {
  /// The configuration file in use.
  pub fn config_path(&self) -> PathBuf { self.config.clone().unwrap_or_else(Config::default_path) }

  /// Loads the configuration, falling back to defaults when no file exists yet.
  pub fn load_config(&self) -> Result<Config> {
    let path = self.config_path();
    trace!("Using configuration at {}", path.display());
    Ok(Config::load_or_default(path)?)
  }
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Entry point for the bibfill CLI application
///
/// Parses arguments, sets up logging and runs the requested command. A failed
/// command is reported on the terminal and ends the process with status 1.
#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let interaction = Terminal::new(cli.accept_defaults);
  let result = match cli.command.clone() {
    Commands::Init(args) => init(&interaction, &cli, args),
    Commands::Lookup(args) => lookup(&interaction, &cli, args).await,
    Commands::Batch(args) => batch(&interaction, &cli, args).await,
    Commands::Providers => providers(&interaction, &cli),
  };

  if let Err(e) = result {
    debug!("Command failed: {e:?}");
    if interaction.reply(ResponseContent::Error(&e)).is_err() {
      eprintln!("{e}");
    }
    std::process::exit(1);
  }
}

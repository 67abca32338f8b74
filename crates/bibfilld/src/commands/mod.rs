use super::*;

pub mod batch;
pub mod init;
pub mod lookup;
pub mod providers;

pub use batch::{batch, BatchArgs};
pub use init::{init, InitArgs};
pub use lookup::{lookup, LookupArgs};
pub use providers::providers;

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a configuration file and the default provider definitions
  Init(InitArgs),

  /// Look up a single ISBN and show its metadata
  Lookup(LookupArgs),

  /// Enrich every ISBN in a file and write the result tables
  Batch(BatchArgs),

  /// Show the configured provider chain
  Providers,
}

//! Error types for the bibfill command line.

use thiserror::Error;

use super::*;

/// Error type alias used throughout the CLI.
pub type Result<T> = core::result::Result<T, BibfilldError>;

/// Errors that can end a CLI command.
#[derive(Error, Debug)]
pub enum BibfilldError {
  /// Anything the library reports: configuration, tables, providers
  #[error(transparent)]
  Bibfill(#[from] BibfillError),

  /// A prompt could not be shown or answered
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// Writing to the terminal failed
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A record could not be rendered as JSON
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The input table does not exist
  #[error("Input file {0} does not exist")]
  MissingInput(PathBuf),
}

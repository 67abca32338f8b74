//! Error types for the bibfill library.
//!
//! Provider failures never leave the lookup path as errors: the [`Fetcher`](crate::fetcher)
//! turns every [`BibfillError`] it sees into a not-found [`Record`](crate::record::Record)
//! carrying the error text. The `Result` alias is therefore mostly seen at the
//! edges of the library:
//! - Loading configuration and provider definitions
//! - Reading identifier tables and writing exports
//! - Implementing a custom [`Provider`](crate::provider::Provider)
//!
//! # Examples
//!
//! ```
//! use bibfill::error::BibfillError;
//!
//! let err = BibfillError::MissingCredentials("google_books".to_string());
//! assert!(!err.is_retryable());
//! assert_eq!(err.to_string(), "Provider `google_books` requires an API key but none was configured");
//! ```

use thiserror::Error;

/// Error type alias used for the [`bibfill`](crate) crate.
pub type Result<T> = core::result::Result<T, BibfillError>;

/// Errors that can occur while looking up book metadata.
#[derive(Error, Debug)]
pub enum BibfillError {
  /// A network request failed before a response was received.
  ///
  /// This covers connection failures, DNS errors, TLS errors and the
  /// per-request timeout.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A provider answered with a non-success HTTP status.
  ///
  /// The raw response body is kept so that it can be surfaced in the
  /// attempt log of a not-found record.
  #[error("{provider} returned HTTP {status}")]
  Status {
    /// Name of the provider that answered
    provider: String,
    /// The HTTP status code
    status:   u16,
    /// Raw response body, possibly empty
    body:     String,
  },

  /// The provider requires an API key and none is available.
  ///
  /// Raised before any network traffic happens.
  #[error("Provider `{0}` requires an API key but none was configured")]
  MissingCredentials(String),

  /// A provider response could not be decoded as JSON.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A TOML configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration value could not be serialized to TOML.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// Reading an identifier table or writing an export failed.
  #[error(transparent)]
  Csv(#[from] csv::Error),

  /// A provider endpoint template did not produce a valid URL.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// The configuration names a provider that has no definition.
  #[error("No provider definition found for `{0}`")]
  UnknownProvider(String),

  /// A lookup task died before producing a record.
  #[error("Lookup worker failed: {0}")]
  Worker(String),

  /// Any other configuration problem.
  #[error("{0}")]
  Config(String),
}

impl BibfillError {
  /// Whether the failed operation is worth repeating.
  ///
  /// Transport failures and HTTP error statuses are transient from the point of view
  /// of a [`RetryPolicy`](crate::retry::RetryPolicy); everything else is permanent.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::Network(_) | Self::Status { .. }) }

  /// Raw response body attached to the error, if any.
  pub fn body(&self) -> Option<&str> {
    match self {
      Self::Status { body, .. } if !body.is_empty() => Some(body),
      _ => None,
    }
  }
}

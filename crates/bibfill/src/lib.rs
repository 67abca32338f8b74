//! Bibliographic metadata enrichment for lists of ISBNs.
//!
//! `bibfill` takes book identifiers, asks a chain of public book APIs about each
//! one, and collects the answers into flat records ready for tabular export:
//!
//! - Ordered provider chains with per-provider retry policies
//! - Declarative TOML provider definitions (endpoint, identifier form, field maps)
//! - Bounded concurrent batch lookups with progress reporting
//! - Found, not-found and error buckets with CSV export
//!
//! # Getting Started
//!
//! ```no_run
//! use bibfill::{config::Config, coordinator::Coordinator, table};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default();
//!   let coordinator = Coordinator::from_config(&config)?;
//!
//!   let identifiers = table::read_identifiers("isbns.csv")?;
//!   let report = coordinator.lookup_many(identifiers).await;
//!   println!("{} found, {} not found", report.found_count(), report.not_found.len());
//!
//!   table::export(&report, ".", chrono::Local::now().date_naive())?;
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`isbn`]: Identifier normalization
//! - [`record`]: The flat record produced for every identifier
//! - [`provider`]: The provider trait and the TOML-driven HTTP provider
//! - [`retry`]: Retry policies and backoff
//! - [`fetcher`]: Single-identifier lookup over a provider chain
//! - [`coordinator`]: Concurrent batch lookups and result buckets
//! - [`table`]: Reading identifier lists and writing result tables
//! - [`config`]: Session configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use url::Url;
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod isbn;
pub mod provider;
pub mod record;
pub mod retry;
pub mod table;

use crate::{
  config::Config, error::*, fetcher::Fetcher, isbn::*, provider::*, record::*, retry::RetryPolicy,
};

/// Common traits and types for ergonomic imports.
///
/// # Usage
///
/// ```no_run
/// use bibfill::prelude::*;
///
/// async fn example() -> Result<(), BibfillError> {
///   let fetcher = Fetcher::from_config(&Config::default())?;
///   let record = fetcher.fetch("9780143127741").await;
///   println!("{}", record.title());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    config::Config,
    coordinator::{Coordinator, Report},
    error::BibfillError,
    fetcher::Fetcher,
    isbn::Isbn,
    provider::Provider,
    record::{Field, Record},
  };
}

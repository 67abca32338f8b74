//! Single-identifier lookup over an ordered chain of providers.
//!
//! The [`Fetcher`] asks each [`Provider`] in turn and keeps the first usable
//! record (see [`Record::is_usable`]). It never fails: when every provider comes
//! up empty the caller gets a [`Record::not_found`] sentinel carrying the first
//! provider diagnostic as its error and the full [`AttemptLog`].
//!
//! # Examples
//!
//! ```no_run
//! use bibfill::{config::Config, fetcher::Fetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::from_config(&Config::default())?;
//!
//! let record = fetcher.fetch("978-0-14-312774-1").await;
//! println!("{} ({})", record.title(), record.source);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use super::*;

/// Ordered provider chain for single lookups.
#[derive(Clone, Default)]
pub struct Fetcher {
  /// Providers in the order they are queried
  providers: Vec<Arc<dyn Provider>>,
}

impl std::fmt::Debug for Fetcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Fetcher")
      .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
      .finish()
  }
}

impl Fetcher {
  /// An empty chain. Every lookup on it yields a not-found record.
  pub fn new() -> Self { Self::default() }

  /// Builds the chain described by `config`.
  pub fn from_config(config: &Config) -> Result<Self> {
    config.provider_configs()?.into_iter().try_fold(Self::new(), |fetcher, provider| {
      Ok(fetcher.with_provider(HttpProvider::new(provider)?))
    })
  }

  /// Appends a provider to the end of the chain.
  pub fn with_provider(self, provider: impl Provider + 'static) -> Self {
    self.with_shared_provider(Arc::new(provider))
  }

  /// Appends an already shared provider to the end of the chain.
  pub fn with_shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
    self.providers.push(provider);
    self
  }

  /// Names of the providers, in query order.
  pub fn provider_names(&self) -> Vec<&str> { self.providers.iter().map(|p| p.name()).collect() }

  /// Looks up one identifier.
  ///
  /// The returned record always carries `identifier` unchanged as its ISBN, and
  /// either the producing provider's name or [`NO_SOURCE`] as its source.
  pub async fn fetch(&self, identifier: &str) -> Record {
    let isbn = Isbn::new(identifier);
    let mut log = AttemptLog::default();

    for provider in &self.providers {
      match provider.lookup(&isbn).await {
        Ok(Some(record)) if record.is_usable() => {
          debug!(isbn = %isbn, provider = provider.name(), "Found \"{}\"", record.title());
          return Record {
            isbn: identifier.to_string(),
            source: provider.name().to_string(),
            ..record
          };
        },
        Ok(Some(_)) => {
          debug!(isbn = %isbn, provider = provider.name(), "Entry without a usable title");
        },
        Ok(None) => {
          debug!(isbn = %isbn, provider = provider.name(), "No match");
        },
        Err(e) => {
          warn!(isbn = %isbn, provider = provider.name(), error = %e, "Provider lookup failed");
          log.push(Attempt {
            provider: provider.name().to_string(),
            endpoint: provider.endpoint(&isbn),
            error:    e.to_string(),
            body:     e.body().map(str::to_string),
          });
        },
      }
    }

    let mut record = Record::not_found(identifier);
    if let Some(first) = log.attempts().first() {
      record = record.with_error(first.error.clone());
    }
    record.with_log(log)
  }
}

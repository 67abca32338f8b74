//! Concurrent lookups over a list of identifiers.
//!
//! The [`Coordinator`] runs one [`Fetcher::fetch`] per identifier, keeping at most
//! `concurrency` of them in flight. Each lookup runs in its own task so that a
//! panicking provider only costs the record it was working on. Results are
//! gathered in completion order and split into the buckets of a [`Report`].
//!
//! # Examples
//!
//! ```no_run
//! use bibfill::{config::Config, coordinator::Coordinator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = Coordinator::from_config(&Config::default())?;
//! let report = coordinator
//!   .lookup_many_with_progress(["9780143127741", "0000000000000"], |progress| {
//!     println!("{progress}");
//!   })
//!   .await;
//! assert_eq!(report.records.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use futures::{stream, StreamExt};

use super::*;

/// Completion count reported after every finished lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  /// Lookups finished so far
  pub completed: usize,
  /// Lookups in the batch
  pub total:     usize,
}

impl Progress {
  /// Fraction of the batch that is done, `1.0` for an empty batch.
  pub fn ratio(&self) -> f64 {
    if self.total == 0 {
      1.0
    } else {
      self.completed as f64 / self.total as f64
    }
  }
}

impl Display for Progress {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Processed {} of {} ISBNs", self.completed, self.total)
  }
}

/// An identifier whose lookup produced an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
  /// The identifier as given
  #[serde(rename = "ISBN")]
  pub isbn:  String,
  /// The error text carried by its record
  #[serde(rename = "Error")]
  pub error: String,
}

/// Outcome of a batch lookup.
///
/// The three buckets are derived independently from `records`: a not-found
/// record with an error shows up both in [`not_found`](Self::not_found) and in
/// [`errors`](Self::errors).
#[derive(Debug, Clone, Default)]
pub struct Report {
  /// One record per input identifier, in completion order
  pub records:   Vec<Record>,
  /// Identifiers whose record is the not-found sentinel
  pub not_found: Vec<String>,
  /// Identifiers whose record carries an error
  pub errors:    Vec<ErrorEntry>,
  /// Wall-clock duration of the batch
  pub elapsed:   Duration,
}

impl Report {
  /// Partitions `records` into the report buckets.
  pub fn from_records(records: Vec<Record>, elapsed: Duration) -> Self {
    let not_found =
      records.iter().filter(|record| record.is_not_found()).map(|r| r.isbn.clone()).collect();
    let errors = records
      .iter()
      .filter_map(|record| {
        record
          .error
          .as_ref()
          .map(|error| ErrorEntry { isbn: record.isbn.clone(), error: error.clone() })
      })
      .collect();

    Self { records, not_found, errors, elapsed }
  }

  /// Records that found a match.
  pub fn found(&self) -> impl Iterator<Item = &Record> {
    self.records.iter().filter(|record| !record.is_not_found())
  }

  /// Number of records that found a match.
  pub fn found_count(&self) -> usize { self.found().count() }

  /// Number of identifiers in the batch.
  pub fn total(&self) -> usize { self.records.len() }
}

/// Bounded-concurrency batch runner.
#[derive(Debug, Clone)]
pub struct Coordinator {
  /// Shared provider chain
  fetcher:     Arc<Fetcher>,
  /// Maximum lookups in flight, at least one
  concurrency: usize,
}

impl Coordinator {
  /// Wraps `fetcher`. A `concurrency` of zero is treated as one.
  pub fn new(fetcher: Fetcher, concurrency: usize) -> Self {
    Self { fetcher: Arc::new(fetcher), concurrency: concurrency.max(1) }
  }

  /// Builds the provider chain and concurrency limit described by `config`.
  pub fn from_config(config: &Config) -> Result<Self> {
    Ok(Self::new(Fetcher::from_config(config)?, config.concurrency))
  }

  /// The effective concurrency limit.
  pub fn concurrency(&self) -> usize { self.concurrency }

  /// The underlying provider chain.
  pub fn fetcher(&self) -> &Fetcher { &self.fetcher }

  /// Looks up every identifier. See [`lookup_many_with_progress`](Self::lookup_many_with_progress).
  pub async fn lookup_many<I, S>(&self, identifiers: I) -> Report
  where
    I: IntoIterator<Item = S>,
    S: Into<String>, {
    self.lookup_many_with_progress(identifiers, |_| {}).await
  }

  /// Looks up every identifier, calling `on_progress` after each completion.
  ///
  /// The report holds exactly one record per input identifier, duplicates
  /// included. Progress counts are strictly increasing and end at the total.
  pub async fn lookup_many_with_progress<I, S, F>(
    &self,
    identifiers: I,
    mut on_progress: F,
  ) -> Report
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnMut(Progress), {
    let started = Instant::now();
    let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
    let total = identifiers.len();
    if total == 0 {
      return Report::default();
    }

    info!(total, concurrency = self.concurrency, "Starting batch lookup");

    let mut lookups = stream::iter(identifiers)
      .map(|identifier| {
        let fetcher = self.fetcher.clone();
        async move {
          let task = tokio::spawn({
            let identifier = identifier.clone();
            async move { fetcher.fetch(&identifier).await }
          });
          match task.await {
            Ok(record) => record,
            Err(e) => {
              let error = BibfillError::Worker(e.to_string());
              warn!(isbn = %identifier, error = %error, "Lookup task aborted");
              Record::not_found(identifier).with_error(error.to_string())
            },
          }
        }
      })
      .buffer_unordered(self.concurrency);

    let mut records = Vec::with_capacity(total);
    while let Some(record) = lookups.next().await {
      records.push(record);
      let progress = Progress { completed: records.len(), total };
      trace!("{progress}");
      on_progress(progress);
    }

    let report = Report::from_records(records, started.elapsed());
    info!(
      total,
      found = report.found_count(),
      not_found = report.not_found.len(),
      errors = report.errors.len(),
      "Batch lookup finished"
    );
    report
  }
}

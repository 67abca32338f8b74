//! Metadata records produced for each looked up identifier.
//!
//! A [`Record`] is created by the [`Fetcher`](crate::fetcher::Fetcher) and never
//! mutated afterwards. Successful and unsuccessful lookups share the same shape:
//! an unsuccessful one has the [`NOT_FOUND`] sentinel as its title and
//! [`NO_SOURCE`] as its source, and usually carries an error and an attempt log.

use std::{collections::BTreeMap, str::FromStr};

use super::*;

/// Title given to records for which no provider produced usable metadata.
pub const NOT_FOUND: &str = "Not Found";

/// Source given to records that no provider produced.
pub const NO_SOURCE: &str = "None";

/// The recognized metadata fields.
///
/// The declaration order is the column order of the found-records export, and
/// since `Field` is `Ord` a `BTreeMap<Field, _>` iterates in that order too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
  #[serde(rename = "ISBN")]
  Isbn,
  Title,
  Authors,
  Publisher,
  PublishedDate,
  Description,
  PageCount,
  Categories,
  Language,
  PreviewLink,
  Identifiers,
  Source,
}

impl Field {
  /// Every field, in export column order.
  pub const ALL: [Field; 12] = [
    Field::Isbn,
    Field::Title,
    Field::Authors,
    Field::Publisher,
    Field::PublishedDate,
    Field::Description,
    Field::PageCount,
    Field::Categories,
    Field::Language,
    Field::PreviewLink,
    Field::Identifiers,
    Field::Source,
  ];

  /// Column name used in exports and displays.
  pub fn as_str(&self) -> &'static str {
    match self {
      Field::Isbn => "ISBN",
      Field::Title => "Title",
      Field::Authors => "Authors",
      Field::Publisher => "Publisher",
      Field::PublishedDate => "PublishedDate",
      Field::Description => "Description",
      Field::PageCount => "PageCount",
      Field::Categories => "Categories",
      Field::Language => "Language",
      Field::PreviewLink => "PreviewLink",
      Field::Identifiers => "Identifiers",
      Field::Source => "Source",
    }
  }

  /// Whether a provider may map this field.
  ///
  /// `ISBN` and `Source` are always set by the fetcher itself.
  pub fn is_mappable(&self) -> bool { !matches!(self, Field::Isbn | Field::Source) }
}

impl Display for Field {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Field {
  type Err = BibfillError;

  fn from_str(s: &str) -> Result<Self> {
    Field::ALL
      .into_iter()
      .find(|field| field.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| BibfillError::Config(format!("Unknown field `{s}`")))
  }
}

/// One failed provider attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
  /// Provider name
  pub provider: String,
  /// Request URL with any API key masked
  pub endpoint: String,
  /// Human readable error
  pub error:    String,
  /// Raw error body returned by the provider, if any
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body:     Option<String>,
}

/// Structured trace of the failed attempts behind a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptLog(pub Vec<Attempt>);

impl AttemptLog {
  /// Whether no attempt was recorded.
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The recorded attempts in the order they happened.
  pub fn attempts(&self) -> &[Attempt] { &self.0 }

  /// Appends an attempt.
  pub fn push(&mut self, attempt: Attempt) { self.0.push(attempt) }
}

/// Metadata for one looked up identifier.
///
/// # Examples
///
/// ```
/// use bibfill::record::{Field, Record, NOT_FOUND, NO_SOURCE};
///
/// let record = Record::not_found("0000000000000");
/// assert!(record.is_not_found());
/// assert_eq!(record.get(Field::Title), Some(NOT_FOUND));
/// assert_eq!(record.get(Field::Source), Some(NO_SOURCE));
/// assert_eq!(record.get(Field::Isbn), Some("0000000000000"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// The identifier exactly as supplied by the user
  #[serde(rename = "ISBN")]
  pub isbn:   String,
  /// Mapped metadata; never contains [`Field::Isbn`] or [`Field::Source`]
  #[serde(flatten)]
  pub fields: BTreeMap<Field, String>,
  /// Name of the provider that produced the record, or [`NO_SOURCE`]
  #[serde(rename = "Source")]
  pub source: String,
  /// Diagnostic for an unsuccessful lookup
  #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
  pub error:  Option<String>,
  /// Trace of failed provider attempts
  #[serde(rename = "Log", default, skip_serializing_if = "Option::is_none")]
  pub log:    Option<AttemptLog>,
}

impl Record {
  /// An empty record for `isbn` with no source yet.
  pub fn new(isbn: impl Into<String>) -> Self {
    Self {
      isbn:   isbn.into(),
      fields: BTreeMap::new(),
      source: NO_SOURCE.to_string(),
      error:  None,
      log:    None,
    }
  }

  /// The sentinel record for an identifier no provider could resolve.
  pub fn not_found(isbn: impl Into<String>) -> Self {
    Self::new(isbn).with_field(Field::Title, NOT_FOUND)
  }

  /// Sets a mapped field. `ISBN` and `Source` are routed to their dedicated members.
  pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
    self.set(field, value);
    self
  }

  /// Attaches a diagnostic.
  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }

  /// Attaches an attempt log, dropping it if it is empty.
  pub fn with_log(mut self, log: AttemptLog) -> Self {
    self.log = (!log.is_empty()).then_some(log);
    self
  }

  /// Sets a field in place.
  pub fn set(&mut self, field: Field, value: impl Into<String>) {
    match field {
      Field::Isbn => self.isbn = value.into(),
      Field::Source => self.source = value.into(),
      field => {
        self.fields.insert(field, value.into());
      },
    }
  }

  /// Looks up any field, including `ISBN` and `Source`.
  pub fn get(&self, field: Field) -> Option<&str> {
    match field {
      Field::Isbn => Some(&self.isbn),
      Field::Source => Some(&self.source),
      field => self.fields.get(&field).map(String::as_str),
    }
  }

  /// The title, or an empty string if none was mapped.
  pub fn title(&self) -> &str { self.get(Field::Title).unwrap_or_default() }

  /// Whether this record is the not-found sentinel.
  pub fn is_not_found(&self) -> bool { self.title() == NOT_FOUND }

  /// Whether this record has a real title.
  ///
  /// A usable record has a title that is present, not blank and not the
  /// [`NOT_FOUND`] sentinel. The fetcher only accepts usable records from providers.
  pub fn is_usable(&self) -> bool {
    let title = self.title().trim();
    !title.is_empty() && title != NOT_FOUND
  }

  /// All present fields in export column order, `ISBN` and `Source` included.
  pub fn columns(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
    Field::ALL.into_iter().filter_map(|field| self.get(field).map(|value| (field, value)))
  }
}

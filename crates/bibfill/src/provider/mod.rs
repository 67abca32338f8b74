//! Book metadata providers.
//!
//! A [`Provider`] turns an [`Isbn`] into an optional [`Record`]. The
//! [`Fetcher`](crate::fetcher::Fetcher) chains providers in a fixed order, so
//! adding a source means adding a provider, not touching the chain.
//!
//! Most providers are plain JSON-over-HTTP APIs and are described entirely by a
//! [`ProviderConfig`] loaded from TOML and run by [`HttpProvider`]:
//!
//! ```toml
//! name              = "google_books"
//! endpoint_template = "https://www.googleapis.com/books/v1/volumes?q=isbn:{identifier}"
//! identifier        = "digits"
//! api_key_env       = "GOOGLE_BOOKS_API_KEY"
//! root              = "items/0/volumeInfo"
//!
//! [retry]
//! max_attempts = 3
//! backoff      = { type = "fixed", delay_ms = 1000 }
//!
//! [field_maps]
//! Title   = { path = "title" }
//! Authors = { path = "authors", transform = { type = "join", delimiter = ", " } }
//! ```
//!
//! Two definitions ship with the crate, see [`ProviderConfig::defaults`].

use std::{collections::BTreeMap, time::Duration};

use serde_json::Value;

use super::*;

pub mod mapping;

pub use self::mapping::{FieldMap, Transform};

/// Built-in definition of the primary provider.
pub const GOOGLE_BOOKS_CONFIG: &str = include_str!("../../config/providers/google_books.toml");
/// Built-in definition of the secondary provider.
pub const OPEN_LIBRARY_CONFIG: &str = include_str!("../../config/providers/open_library.toml");

/// A source of book metadata.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use bibfill::{
///   error::Result,
///   isbn::Isbn,
///   provider::Provider,
///   record::{Field, Record},
/// };
///
/// struct Shelf;
///
/// #[async_trait]
/// impl Provider for Shelf {
///   fn name(&self) -> &str { "shelf" }
///
///   async fn lookup(&self, isbn: &Isbn) -> Result<Option<Record>> {
///     Ok((isbn.digits() == "9780143127741")
///       .then(|| Record::new(isbn.raw()).with_field(Field::Title, "Being Mortal")))
///   }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
  /// Name recorded as the `Source` of records this provider produces.
  fn name(&self) -> &str;

  /// Request target for `isbn` with secrets masked, for attempt logs.
  fn endpoint(&self, _isbn: &Isbn) -> String { String::new() }

  /// Looks up `isbn`.
  ///
  /// `Ok(None)` means the provider was reachable and has no entry. Errors are
  /// for failures that should be reported as diagnostics.
  async fn lookup(&self, isbn: &Isbn) -> Result<Option<Record>>;
}

/// Configuration for a JSON-over-HTTP provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
  /// Name of this provider, also used as the record `Source`
  pub name:              String,
  /// URL template; `{identifier}` is replaced by the normalized, URL-encoded ISBN
  pub endpoint_template: String,
  /// Normalization applied to the ISBN before it is put into the query
  #[serde(default)]
  pub identifier:        IdentifierForm,
  /// API key; usually left unset in files and supplied through `api_key_env`
  #[serde(default)]
  pub api_key:           Option<String>,
  /// Environment variable the API key is read from
  #[serde(default)]
  pub api_key_env:       Option<String>,
  /// Query parameter the API key is sent in
  #[serde(default = "default_api_key_param")]
  pub api_key_param:     String,
  /// Refuse to query without an API key
  #[serde(default)]
  pub requires_key:      bool,
  /// Retry policy for transport and HTTP status errors
  #[serde(default = "RetryPolicy::once")]
  pub retry:             RetryPolicy,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:      u64,
  /// Extra HTTP headers for every request
  #[serde(default)]
  pub headers:           BTreeMap<String, String>,
  /// Path of the matching entry inside the response; `{identifier}` is replaced
  /// by the normalized ISBN. A response without this path has no entry.
  #[serde(default)]
  pub root:              String,
  /// How each record field is read from the entry
  #[serde(deserialize_with = "deserialize_field_maps")]
  pub field_maps:        BTreeMap<Field, FieldMap>,
}

fn default_api_key_param() -> String { "key".to_string() }

fn default_timeout_secs() -> u64 { 5 }

/// Parses field map keys into [`Field`]s, rejecting `ISBN`, `Source` and unknown names.
fn deserialize_field_maps<'de, D>(
  deserializer: D,
) -> std::result::Result<BTreeMap<Field, FieldMap>, D::Error>
where D: serde::Deserializer<'de> {
  let raw: BTreeMap<String, FieldMap> = BTreeMap::deserialize(deserializer)?;
  raw
    .into_iter()
    .map(|(name, map)| {
      let field = name.parse::<Field>().map_err(serde::de::Error::custom)?;
      if !field.is_mappable() {
        return Err(serde::de::Error::custom(format!("`{field}` cannot be mapped by a provider")));
      }
      Ok((field, map))
    })
    .collect()
}

impl ProviderConfig {
  /// Parses a provider definition from TOML.
  pub fn from_toml(toml_str: &str) -> Result<Self> { Ok(toml::from_str(toml_str)?) }

  /// Reads a provider definition from a TOML file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    Self::from_toml(&std::fs::read_to_string(path)?)
  }

  /// The built-in provider chain: Google Books, then Open Library.
  pub fn defaults() -> Result<Vec<Self>> {
    Ok(vec![Self::from_toml(GOOGLE_BOOKS_CONFIG)?, Self::from_toml(OPEN_LIBRARY_CONFIG)?])
  }

  /// Sets the API key explicitly.
  pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
    self.api_key = Some(key.into());
    self
  }

  /// Replaces the endpoint template, e.g. to point at a mock server.
  pub fn with_endpoint_template(mut self, template: impl Into<String>) -> Self {
    self.endpoint_template = template.into();
    self
  }

  /// Replaces the retry policy.
  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// The API key, from the config itself or from `api_key_env`. Blank keys count as absent.
  pub fn resolve_api_key(&self) -> Option<String> {
    self
      .api_key
      .clone()
      .or_else(|| self.api_key_env.as_ref().and_then(|var| std::env::var(var).ok()))
      .filter(|key| !key.trim().is_empty())
  }

  /// Maps a provider response for `query` onto a record keyed by `isbn`.
  ///
  /// Returns `None` when the response has no entry at [`root`](Self::root).
  pub fn map_response(&self, json: &Value, isbn: &Isbn, query: &str) -> Option<Record> {
    let root = mapping::resolve(json, &self.root.replace("{identifier}", query))?;
    if root.is_null() {
      return None;
    }

    let mut record = Record::new(isbn.raw());
    for (field, map) in &self.field_maps {
      if let Some(value) = mapping::extract(&root, map, query) {
        record.set(*field, value);
      }
    }
    Some(record)
  }
}

/// A [`Provider`] driven by a [`ProviderConfig`].
#[derive(Debug, Clone)]
pub struct HttpProvider {
  /// The provider definition
  config:  ProviderConfig,
  /// Key resolved once at construction
  api_key: Option<String>,
  /// Shared client carrying the per-request timeout
  client:  reqwest::Client,
}

impl HttpProvider {
  /// Builds the HTTP client and resolves the API key.
  pub fn new(config: ProviderConfig) -> Result<Self> {
    let client =
      reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
    let api_key = config.resolve_api_key();
    Ok(Self { config, api_key, client })
  }

  /// The provider definition.
  pub fn config(&self) -> &ProviderConfig { &self.config }

  /// The request URL for an already normalized query, with the real API key.
  fn url(&self, query: &str, key: Option<&str>) -> Result<Url> {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let mut url = Url::parse(&self.config.endpoint_template.replace("{identifier}", &encoded))?;
    if let Some(key) = key {
      url.query_pairs_mut().append_pair(&self.config.api_key_param, key);
    }
    Ok(url)
  }

  /// Sends one request and decodes the body.
  async fn request(&self, url: Url, attempt: u32) -> Result<Value> {
    let masked = mask_url(&url, &self.config.api_key_param);
    debug!(provider = %self.config.name, attempt, "GET {masked}");

    let mut request = self.client.get(url);
    for (key, value) in &self.config.headers {
      request = request.header(key, value);
    }

    let response = request.send().await?;
    let status = response.status();
    let data = response.bytes().await?;

    trace!("{} response ({}): {}", self.config.name, status, String::from_utf8_lossy(&data));

    if !status.is_success() {
      return Err(BibfillError::Status {
        provider: self.config.name.clone(),
        status:   status.as_u16(),
        body:     String::from_utf8_lossy(&data).into_owned(),
      });
    }
    Ok(serde_json::from_slice(&data)?)
  }
}

#[async_trait]
impl Provider for HttpProvider {
  fn name(&self) -> &str { &self.config.name }

  fn endpoint(&self, isbn: &Isbn) -> String {
    let query = isbn.normalized(self.config.identifier);
    match self.url(&query, self.api_key.as_deref()) {
      Ok(url) => mask_url(&url, &self.config.api_key_param),
      Err(_) => self.config.endpoint_template.replace("{identifier}", &query),
    }
  }

  async fn lookup(&self, isbn: &Isbn) -> Result<Option<Record>> {
    if self.config.requires_key && self.api_key.is_none() {
      return Err(BibfillError::MissingCredentials(self.config.name.clone()));
    }

    let query = isbn.normalized(self.config.identifier);
    if query.is_empty() {
      debug!(provider = %self.config.name, isbn = %isbn, "Nothing to query after normalization");
      return Ok(None);
    }

    let url = self.url(&query, self.api_key.as_deref())?;
    let json = self.config.retry.run(|attempt| self.request(url.clone(), attempt)).await?;

    let record = self.config.map_response(&json, isbn, &query);
    if record.is_none() {
      debug!(provider = %self.config.name, isbn = %isbn, "No items found");
    }
    Ok(record)
  }
}

/// Hides all but the first four characters of a secret.
pub fn mask_key(key: &str) -> String {
  let visible: String = key.chars().take(4).collect();
  if key.chars().count() <= 4 {
    "****".to_string()
  } else {
    format!("{visible}****")
  }
}

/// Renders `url` with the value of `key_param` masked.
fn mask_url(url: &Url, key_param: &str) -> String {
  if !url.query_pairs().any(|(name, _)| name == key_param) {
    return url.to_string();
  }

  let pairs: Vec<(String, String)> = url
    .query_pairs()
    .map(|(name, value)| {
      let value = if name == key_param { mask_key(&value) } else { value.into_owned() };
      (name.into_owned(), value)
    })
    .collect();

  let mut masked = url.clone();
  masked.query_pairs_mut().clear().extend_pairs(pairs);
  masked.to_string()
}

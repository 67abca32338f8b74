//! Explicit configuration for a lookup session.
//!
//! Nothing in the library reads global state: a [`Config`] value is built (or
//! loaded from TOML) once and handed to [`Fetcher::from_config`] and
//! [`Coordinator::from_config`].
//!
//! ```toml
//! # ~/.config/bibfill/config.toml
//! providers      = ["google_books", "open_library"]
//! providers_path = "/home/me/.config/bibfill/providers"
//! ```
//!
//! The concurrency limit is deliberately not part of the file format.

use super::*;

/// Default number of lookups in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Provider names in the order they are queried
  #[serde(default = "default_providers")]
  pub providers:      Vec<String>,
  /// Directory searched for `<name>.toml` provider definitions before the built-ins
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub providers_path: Option<PathBuf>,
  /// Maximum number of lookups in flight
  #[serde(skip, default = "default_concurrency")]
  pub concurrency:    usize,
}

fn default_providers() -> Vec<String> {
  vec!["google_books".to_string(), "open_library".to_string()]
}

fn default_concurrency() -> usize { DEFAULT_CONCURRENCY }

impl Default for Config {
  fn default() -> Self {
    Self {
      providers:      default_providers(),
      providers_path: None,
      concurrency:    DEFAULT_CONCURRENCY,
    }
  }
}

impl Config {
  /// Returns the default path for the configuration file.
  ///
  /// The path is constructed as follows:
  /// - On Unix: `~/.config/bibfill/config.toml`
  /// - On macOS: `~/Library/Application Support/bibfill/config.toml`
  /// - On Windows: `%APPDATA%\bibfill\config.toml`
  /// - Fallback: `./bibfill/config.toml`
  pub fn default_path() -> PathBuf { Self::default_dir().join("config.toml") }

  /// Returns the default directory for provider definitions.
  pub fn default_providers_path() -> PathBuf { Self::default_dir().join("providers") }

  /// Directory holding the configuration file.
  fn default_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("bibfill")
  }

  /// Reads a configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
  }

  /// Reads a configuration file, falling back to defaults if it does not exist.
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if path.exists() {
      Self::load(path)
    } else {
      debug!("No config at {}, using defaults", path.display());
      Ok(Self::default())
    }
  }

  /// Writes this configuration as TOML, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Sets the provider order.
  pub fn with_providers<I, S>(mut self, providers: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>, {
    self.providers = providers.into_iter().map(Into::into).collect();
    self
  }

  /// Sets the directory searched for provider definitions.
  pub fn with_providers_path(mut self, path: impl AsRef<Path>) -> Self {
    self.providers_path = Some(path.as_ref().to_path_buf());
    self
  }

  /// Sets the concurrency limit. Zero is treated as one by the coordinator.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency;
    self
  }

  /// Resolves every configured provider name to its definition.
  ///
  /// A `<name>.toml` file in [`providers_path`](Self::providers_path) takes
  /// precedence over the built-in definition of the same name.
  pub fn provider_configs(&self) -> Result<Vec<ProviderConfig>> {
    let builtins = ProviderConfig::defaults()?;

    self
      .providers
      .iter()
      .map(|name| {
        if let Some(dir) = &self.providers_path {
          let path = dir.join(format!("{name}.toml"));
          if path.exists() {
            trace!("Loading provider {} from {}", name, path.display());
            let config = ProviderConfig::from_file(&path)?;
            if &config.name != name {
              return Err(BibfillError::Config(format!(
                "{} defines provider `{}`, expected `{}`",
                path.display(),
                config.name,
                name
              )));
            }
            return Ok(config);
          }
        }
        builtins
          .iter()
          .find(|config| &config.name == name)
          .cloned()
          .ok_or_else(|| BibfillError::UnknownProvider(name.clone()))
      })
      .collect()
  }

  /// Writes the built-in provider definitions into `dir` as editable TOML files.
  pub fn write_default_providers(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    [("google_books.toml", GOOGLE_BOOKS_CONFIG), ("open_library.toml", OPEN_LIBRARY_CONFIG)]
      .into_iter()
      .map(|(file, content)| {
        let path = dir.join(file);
        std::fs::write(&path, content)?;
        Ok(path)
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.providers, ["google_books", "open_library"]);
    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);

    let names: Vec<_> =
      config.provider_configs().unwrap().into_iter().map(|provider| provider.name).collect();
    assert_eq!(names, ["google_books", "open_library"]);
  }

  #[test]
  fn test_concurrency_is_not_read_from_file() {
    let config: Config =
      toml::from_str("providers = [\"open_library\"]\nconcurrency = 99").unwrap();
    assert_eq!(config.providers, ["open_library"]);
    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);

    let written = toml::to_string_pretty(&config.with_concurrency(3)).unwrap();
    assert!(!written.contains("concurrency"));
  }

  #[test]
  fn test_unknown_provider() {
    let config = Config::default().with_providers(["google_books", "worldcat"]);
    assert!(matches!(
      config.provider_configs(),
      Err(BibfillError::UnknownProvider(name)) if name == "worldcat"
    ));
  }

  #[test]
  fn test_provider_file_overrides_builtin() {
    let dir = tempdir().unwrap();
    let custom = OPEN_LIBRARY_CONFIG.replace("timeout_secs      = 5", "timeout_secs      = 30");
    std::fs::write(dir.path().join("open_library.toml"), custom).unwrap();

    let config = Config::default().with_providers_path(dir.path());
    let providers = config.provider_configs().unwrap();
    assert_eq!(providers[0].timeout_secs, 5);
    assert_eq!(providers[1].timeout_secs, 30);
  }

  #[test]
  fn test_save_load_and_write_providers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config::default().with_providers_path(dir.path().join("providers"));
    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);

    let written = Config::write_default_providers(dir.path().join("providers")).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(Config::load(&path).unwrap().provider_configs().unwrap().len(), 2);
  }

  #[test]
  fn test_missing_file_falls_back_to_default() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
  }
}

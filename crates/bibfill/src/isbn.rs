//! Book identifiers as they arrive from users.
//!
//! An [`Isbn`] is deliberately lenient: any string is accepted, no checksum is
//! verified, and the original spelling is kept so results can be reported back
//! under the exact key the user supplied. Providers pick the normalized form
//! they want through [`IdentifierForm`].

use super::*;

lazy_static! {
  /// Anything that is not an ASCII digit.
  static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();
  /// Hyphens and any whitespace.
  static ref SEPARATOR: Regex = Regex::new(r"[\s\-]").unwrap();
}

/// A user supplied book identifier.
///
/// # Examples
///
/// ```
/// use bibfill::isbn::Isbn;
///
/// let isbn = Isbn::new(" 978-0-14-312774-1 ");
/// assert_eq!(isbn.raw(), " 978-0-14-312774-1 ");
/// assert_eq!(isbn.digits(), "9780143127741");
/// assert_eq!(isbn.compact(), "9780143127741");
///
/// let isbn = Isbn::new("0-8044-2957-X");
/// assert_eq!(isbn.digits(), "080442957");
/// assert_eq!(isbn.compact(), "080442957X");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(String);

/// Which normalization of an [`Isbn`] a provider puts into its query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierForm {
  /// Only the digits, see [`Isbn::digits`]
  #[default]
  Digits,
  /// Hyphens and whitespace removed, see [`Isbn::compact`]
  Compact,
}

impl Isbn {
  /// Wraps a raw identifier without validating it.
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  /// The identifier exactly as it was supplied.
  pub fn raw(&self) -> &str { &self.0 }

  /// Every non-digit character stripped.
  ///
  /// Note that this also drops a trailing ISBN-10 `X` check character.
  pub fn digits(&self) -> String { NON_DIGIT.replace_all(&self.0, "").into_owned() }

  /// Hyphens and whitespace stripped, everything else kept.
  pub fn compact(&self) -> String { SEPARATOR.replace_all(&self.0, "").into_owned() }

  /// The normalization requested by `form`.
  pub fn normalized(&self, form: IdentifierForm) -> String {
    match form {
      IdentifierForm::Digits => self.digits(),
      IdentifierForm::Compact => self.compact(),
    }
  }
}

impl Display for Isbn {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for Isbn {
  fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for Isbn {
  fn from(value: String) -> Self { Self(value) }
}

//! Projection of provider JSON responses onto record fields.

use serde_json::Value;

use super::*;

/// Field mapping configuration.
///
/// Defines how to extract and transform one [`Field`] from a provider response.
/// Paths are `/`-separated and relative to the provider's response root. A numeric
/// component indexes into an array; any other component applied to an array is
/// applied to each element and the matches are collected.
///
/// # Examples
///
/// ```toml
/// [field_maps]
/// Authors     = { path = "authors/name", transform = { type = "join", delimiter = ", " } }
/// Language    = { path = "languages/key", transform = { type = "last_segment" } }
/// Identifiers = { path = "identifiers", transform = { type = "entries" }, default = "ISBN:{identifier}" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMap {
  /// Path to the value inside the response root
  pub path:      String,
  /// Optional transformation applied to the extracted value
  #[serde(default)]
  pub transform: Option<Transform>,
  /// Template used when the path yields nothing; `{identifier}` is substituted
  #[serde(default)]
  pub default:   Option<String>,
}

/// Available value transformations.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
  /// Join a list of scalars
  Join {
    /// Separator placed between items
    #[serde(default = "default_delimiter")]
    delimiter: String,
  },
  /// Keep only what follows the last separator, e.g. `/languages/eng` to `eng`
  LastSegment {
    /// Segment separator
    #[serde(default = "default_segment_separator")]
    separator: String,
  },
  /// Render a list of objects as `key: value` pairs, e.g. industry identifiers
  Pairs {
    /// Member holding the label
    key:       String,
    /// Member holding the value
    value:     String,
    /// Text between label and value
    #[serde(default = "default_pair_separator")]
    separator: String,
    /// Text between pairs
    #[serde(default = "default_delimiter")]
    delimiter: String,
  },
  /// Render the members of an object as `key: value` pairs
  Entries {
    /// Text between member name and value
    #[serde(default = "default_pair_separator")]
    separator: String,
    /// Text between members
    #[serde(default = "default_entries_delimiter")]
    delimiter: String,
  },
  /// Replace text using a regex pattern
  Replace {
    /// Regular expression to match
    #[serde(deserialize_with = "deserialize_regex")]
    pattern:     Regex,
    /// Replacement text, may reference capture groups
    replacement: String,
  },
  /// Construct a URL from the value
  Url {
    /// Base URL, may contain a `{value}` placeholder
    base:   String,
    /// Optional suffix appended to the URL
    #[serde(default)]
    suffix: Option<String>,
  },
}

fn default_delimiter() -> String { ", ".to_string() }

fn default_entries_delimiter() -> String { "; ".to_string() }

fn default_pair_separator() -> String { ": ".to_string() }

fn default_segment_separator() -> String { "/".to_string() }

/// Custom deserializer for converting string patterns into Regex objects.
fn deserialize_regex<'de, D>(deserializer: D) -> std::result::Result<Regex, D::Error>
where D: serde::Deserializer<'de> {
  let s: String = String::deserialize(deserializer)?;
  Regex::new(&s).map_err(serde::de::Error::custom)
}

/// Resolves a `/`-separated path inside `json`.
///
/// An empty path resolves to `json` itself.
pub fn resolve(json: &Value, path: &str) -> Option<Value> {
  let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
  walk(json, &components)
}

fn walk(current: &Value, path: &[&str]) -> Option<Value> {
  let Some((&component, rest)) = path.split_first() else {
    return Some(current.clone());
  };

  match current {
    Value::Object(map) => walk(map.get(component)?, rest),
    Value::Array(arr) => {
      if let Ok(index) = component.parse::<usize>() {
        return walk(arr.get(index)?, rest);
      }
      let mut values: Vec<Value> = arr.iter().filter_map(|item| walk(item, path)).collect();
      match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Value::Array(values)),
      }
    },
    _ => None,
  }
}

/// Extracts the value described by `map` from `root`.
///
/// Blank results count as missing, in which case the map's `default` template
/// is used if there is one.
pub fn extract(root: &Value, map: &FieldMap, identifier: &str) -> Option<String> {
  let value = resolve(root, &map.path).and_then(|raw| match &map.transform {
    Some(transform) => apply_transform(&raw, transform),
    None => stringify(&raw),
  });

  match value {
    Some(value) if !value.trim().is_empty() => Some(value),
    _ => map.default.as_ref().map(|template| template.replace("{identifier}", identifier)),
  }
}

/// Renders a JSON value as a display string.
///
/// Arrays are joined with `", "`; objects fall back to compact JSON.
pub fn stringify(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Array(arr) => join(arr, ", "),
    Value::Object(_) => Some(value.to_string()),
  }
}

fn join(items: &[Value], delimiter: &str) -> Option<String> {
  let parts: Vec<String> = items.iter().filter_map(stringify).collect();
  (!parts.is_empty()).then(|| parts.join(delimiter))
}

/// Applies `f` to a scalar, or to each element of an array and joins the results.
fn per_item(value: &Value, f: impl Fn(&str) -> String) -> Option<String> {
  match value {
    Value::Array(arr) => {
      let parts: Vec<String> = arr.iter().filter_map(stringify).map(|s| f(&s)).collect();
      (!parts.is_empty()).then(|| parts.join(", "))
    },
    value => stringify(value).map(|s| f(&s)),
  }
}

fn apply_transform(value: &Value, transform: &Transform) -> Option<String> {
  match transform {
    Transform::Join { delimiter } => match value {
      Value::Array(arr) => join(arr, delimiter),
      value => stringify(value),
    },

    Transform::LastSegment { separator } => per_item(value, |s| {
      s.trim_end_matches(separator.as_str())
        .rsplit(separator.as_str())
        .next()
        .unwrap_or_default()
        .to_string()
    }),

    Transform::Pairs { key, value: value_key, separator, delimiter } => {
      let items = match value {
        Value::Array(arr) => arr.as_slice(),
        value => std::slice::from_ref(value),
      };
      let pairs: Vec<String> = items
        .iter()
        .filter_map(|item| {
          let label = item.get(key).and_then(stringify);
          let text = item.get(value_key).and_then(stringify)?;
          Some(match label {
            Some(label) => format!("{label}{separator}{text}"),
            None => text,
          })
        })
        .collect();
      (!pairs.is_empty()).then(|| pairs.join(delimiter))
    },

    Transform::Entries { separator, delimiter } => match value {
      Value::Object(map) => {
        let entries: Vec<String> = map
          .iter()
          .filter_map(|(name, v)| stringify(v).map(|text| format!("{name}{separator}{text}")))
          .collect();
        (!entries.is_empty()).then(|| entries.join(delimiter))
      },
      value => stringify(value),
    },

    Transform::Replace { pattern, replacement } =>
      per_item(value, |s| pattern.replace_all(s, replacement.as_str()).into_owned()),

    Transform::Url { base, suffix } => per_item(value, |s| {
      format!("{}{}", base.replace("{value}", s), suffix.as_deref().unwrap_or(""))
    }),
  }
}

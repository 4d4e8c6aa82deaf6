/*!
Element values.

Values represent the current state of interactive elements:
text content, numeric positions, boolean states.
*/

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Typed value for an accessibility element.
///
/// Only `Text` values are narrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
  /// Text content (text fields, labels)
  Text(String),

  /// Numeric value (sliders)
  Number(f64),

  /// Boolean state (checkboxes)
  Boolean(bool),
}

impl Value {
  /// Get as string reference if this is a non-empty Text value.
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) if !s.is_empty() => Some(s),
      Self::Text(_) | Self::Number(_) | Self::Boolean(_) => None,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Self::Text(s.to_owned())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Self::Text(s)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Self::Number(n)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Self::Boolean(b)
  }
}

/*!
Configuration for narrator.

All values have sensible defaults. Load from JSON, or override in code:

```
use narrator::Config;

let config = Config::from_json(r#"{ "inclusion_list": ["com.apple.TextEdit"] }"#).unwrap();
assert_eq!(config.inclusion_list.len(), 1);
assert_eq!(config.exclusion_list.len(), 2);
assert!(config.prompt_for_trust);
```
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{BundleIdentifier, NarratorError, NarratorResult};

/// Narrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// When non-empty, only these applications are narrated.
  /// Default: empty.
  pub inclusion_list: Vec<BundleIdentifier>,

  /// Applications never narrated, checked before the inclusion list.
  /// Default: the `WebKit` helper processes.
  pub exclusion_list: Vec<BundleIdentifier>,

  /// Ask the OS to prompt for accessibility permission when missing.
  /// Default: true.
  pub prompt_for_trust: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      inclusion_list: Vec::new(),
      exclusion_list: vec![
        BundleIdentifier::new("com.apple.webkit.databases"),
        BundleIdentifier::new("com.apple.webkit.networking"),
      ],
      prompt_for_trust: true,
    }
  }
}

impl Config {
  /// Create a new config with default values.
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a JSON config. Missing fields take their defaults.
  pub fn from_json(json: &str) -> NarratorResult<Self> {
    serde_json::from_str(json).map_err(|e| NarratorError::Config(e.to_string()))
  }

  /// Read and parse a JSON config file.
  pub fn load(path: impl AsRef<Path>) -> NarratorResult<Self> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
      .map_err(|e| NarratorError::Config(format!("{}: {e}", path.display())))?;
    Self::from_json(&json)
  }
}

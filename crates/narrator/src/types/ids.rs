/*! Branded ID types for processes and applications. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Process ID - branded type to distinguish from other u32 values.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
  Into,
)]
pub struct ProcessId(pub u32);

impl ProcessId {
  /// The process this code is running in.
  pub fn current() -> Self {
    Self(std::process::id())
  }
}

/// Application bundle identifier (e.g. `com.apple.TextEdit`).
///
/// Stored lower-cased, so equality and hashing are case-insensitive.
/// Also compares case-insensitively against raw strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BundleIdentifier(String);

impl BundleIdentifier {
  pub fn new(raw: impl AsRef<str>) -> Self {
    Self(raw.as_ref().to_lowercase())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for BundleIdentifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl PartialEq<str> for BundleIdentifier {
  fn eq(&self, other: &str) -> bool {
    self.0 == other.to_lowercase()
  }
}

impl PartialEq<&str> for BundleIdentifier {
  fn eq(&self, other: &&str) -> bool {
    *self == **other
  }
}

impl PartialEq<BundleIdentifier> for &str {
  fn eq(&self, other: &BundleIdentifier) -> bool {
    *other == **self
  }
}

impl From<String> for BundleIdentifier {
  fn from(raw: String) -> Self {
    Self::new(raw)
  }
}

impl From<&str> for BundleIdentifier {
  fn from(raw: &str) -> Self {
    Self::new(raw)
  }
}

impl From<BundleIdentifier> for String {
  fn from(id: BundleIdentifier) -> Self {
    id.0
  }
}

/// Identifies one running process instance: (pid, bundle identifier).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunningApplicationKey {
  pub process_id: ProcessId,
  pub bundle_identifier: BundleIdentifier,
}

impl RunningApplicationKey {
  pub fn new(process_id: ProcessId, bundle_identifier: impl Into<BundleIdentifier>) -> Self {
    Self {
      process_id,
      bundle_identifier: bundle_identifier.into(),
    }
  }
}

impl std::fmt::Display for RunningApplicationKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.bundle_identifier, self.process_id)
  }
}

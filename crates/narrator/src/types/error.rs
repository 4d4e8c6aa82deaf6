/*! Error types for narrator operations. */

use super::{ProcessId, RunningApplicationKey};
use crate::a11y::Notification;

/// One sink that failed while a job was fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
  pub sink: String,
  pub reason: String,
}

impl std::fmt::Display for SinkFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.sink, self.reason)
  }
}

/// Errors that can occur during narrator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarratorError {
  #[error("Accessibility permissions not granted")]
  PermissionDenied,

  #[error("Not implemented")]
  NotImplemented,

  #[error("Notification '{}' is not supported by this element", .0.platform_name())]
  NotificationUnsupported(Notification),

  #[error("Invalid element")]
  InvalidElement,

  #[error("Cannot complete")]
  CannotComplete,

  #[error("No value")]
  NoValue,

  #[error("Attribute not supported: {0}")]
  AttributeUnsupported(&'static str),

  #[error("Process not found: {0}")]
  ProcessNotFound(ProcessId),

  #[error("Ignored {}: {}", .0.process_id, .0.bundle_identifier)]
  Ignored(RunningApplicationKey),

  #[error("{} output sink(s) failed: {}", .0.len(), join_failures(.0))]
  Output(Vec<SinkFailure>),

  #[error("Sink '{sink}' failed: {reason}")]
  Sink { sink: String, reason: String },

  #[error("Invalid configuration: {0}")]
  Config(String),
}

fn join_failures(failures: &[SinkFailure]) -> String {
  failures
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

/// How bad an error is for the surrounding control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// Expected: continue with reduced capability.
  Soft,
  /// Operational: abandon this operation, keep going.
  Transient,
  /// Fatal to the process (or host) it concerns.
  Fatal,
}

impl NarratorError {
  /// Classify this error.
  pub const fn severity(&self) -> Severity {
    match self {
      Self::NotificationUnsupported(_)
      | Self::NoValue
      | Self::AttributeUnsupported(_)
      | Self::Ignored(_) => Severity::Soft,
      Self::NotImplemented
      | Self::InvalidElement
      | Self::CannotComplete
      | Self::Output(_)
      | Self::Sink { .. } => Severity::Transient,
      Self::PermissionDenied | Self::ProcessNotFound(_) | Self::Config(_) => Severity::Fatal,
    }
  }

  /// Log this error at the level its severity calls for.
  pub(crate) fn log(&self, context: &str) {
    match self.severity() {
      Severity::Soft => log::debug!("{context}: {self}"),
      Severity::Transient => log::warn!("{context}: {self}"),
      Severity::Fatal => log::error!("{context}: {self}"),
    }
  }
}

/// Result type for narrator operations.
pub type NarratorResult<T> = Result<T, NarratorError>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::BundleIdentifier;

  #[test]
  fn unsupported_notifications_are_soft() {
    let err = NarratorError::NotificationUnsupported(Notification::SelectedTextChanged);
    assert_eq!(err.severity(), Severity::Soft);
    assert!(err.to_string().contains("AXSelectedTextChanged"));
  }

  #[test]
  fn element_races_are_transient() {
    assert_eq!(NarratorError::InvalidElement.severity(), Severity::Transient);
    assert_eq!(NarratorError::CannotComplete.severity(), Severity::Transient);
  }

  #[test]
  fn aggregated_output_error_names_every_sink() {
    let err = NarratorError::Output(vec![
      SinkFailure {
        sink: "speech".into(),
        reason: "engine busy".into(),
      },
      SinkFailure {
        sink: "braille".into(),
        reason: "no display".into(),
      },
    ]);
    let message = err.to_string();
    assert!(message.starts_with("2 output sink(s) failed"));
    assert!(message.contains("speech: engine busy"));
    assert!(message.contains("braille: no display"));
  }

  #[test]
  fn ignored_names_the_process() {
    let key = RunningApplicationKey::new(ProcessId(42), BundleIdentifier::new("Com.Example.App"));
    assert_eq!(
      NarratorError::Ignored(key).to_string(),
      "Ignored 42: com.example.app"
    );
  }
}

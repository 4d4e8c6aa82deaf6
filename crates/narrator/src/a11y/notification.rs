/*!
Accessibility notifications.

Notifications are events the platform fires when UI elements change.
Controllers subscribe to the ones their role cares about; the application
root subscribes to window and focus notifications.
*/

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Notifications we can subscribe to for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Notification {
  /// Element was destroyed and is no longer valid.
  /// Watched for every element the hierarchy caches.
  Destroyed,

  /// A window was created (application level).
  WindowCreated,

  /// The application's focused window changed (application level).
  FocusedWindowChanged,

  /// The application's focused element changed (application level).
  FocusedUIElementChanged,

  /// Element's value changed (text input, combo box)
  ValueChanged,

  /// Element's title/label changed
  TitleChanged,

  /// Selected children of a list changed
  SelectedChildrenChanged,

  /// Selected rows of a table changed
  SelectedRowsChanged,

  /// Selected columns of a table changed
  SelectedColumnsChanged,

  /// Text selection within the element changed
  SelectedTextChanged,
}

impl Notification {
  /// Notifications the application root subscribes to.
  pub const APPLICATION: &'static [Self] = &[
    Self::WindowCreated,
    Self::FocusedWindowChanged,
    Self::FocusedUIElementChanged,
  ];

  /// macOS `kAX*Notification` string, used in logs and errors.
  pub const fn platform_name(&self) -> &'static str {
    match self {
      Self::Destroyed => "AXUIElementDestroyed",
      Self::WindowCreated => "AXWindowCreated",
      Self::FocusedWindowChanged => "AXFocusedWindowChanged",
      Self::FocusedUIElementChanged => "AXFocusedUIElementChanged",
      Self::ValueChanged => "AXValueChanged",
      Self::TitleChanged => "AXTitleChanged",
      Self::SelectedChildrenChanged => "AXSelectedChildrenChanged",
      Self::SelectedRowsChanged => "AXSelectedRowsChanged",
      Self::SelectedColumnsChanged => "AXSelectedColumnsChanged",
      Self::SelectedTextChanged => "AXSelectedTextChanged",
    }
  }
}

impl std::fmt::Display for Notification {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.platform_name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn application_set_is_window_and_focus() {
    assert_eq!(Notification::APPLICATION.len(), 3);
    assert!(Notification::APPLICATION.contains(&Notification::FocusedUIElementChanged));
    assert!(!Notification::APPLICATION.contains(&Notification::Destroyed));
  }

  #[test]
  fn displays_platform_name() {
    assert_eq!(Notification::Destroyed.to_string(), "AXUIElementDestroyed");
    assert_eq!(
      Notification::SelectedRowsChanged.to_string(),
      "AXSelectedRowsChanged"
    );
  }
}

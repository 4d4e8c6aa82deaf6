/*!
Controller variants and the factory mapping roles onto them.
*/

#![allow(missing_docs)]

use crate::a11y::{Notification, Role};
use crate::platform::PlatformElement;

/// Which controller variant tracks an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerKind {
  Button,
  ComboBox,
  Group,
  List,
  Table,
  TextField,
  TextArea,
  WebArea,
  Window,
  /// Fallback for every role without a dedicated controller.
  Unknown,
}

impl ControllerKind {
  /// Variant for a role. Total: anything unlisted is `Unknown`.
  pub const fn for_role(role: Role) -> Self {
    match role {
      Role::Button => Self::Button,
      Role::ComboBox => Self::ComboBox,
      Role::Group | Role::GenericGroup => Self::Group,
      Role::List => Self::List,
      Role::Table => Self::Table,
      Role::TextField | Role::SearchField => Self::TextField,
      Role::TextArea => Self::TextArea,
      Role::WebArea => Self::WebArea,
      Role::Window => Self::Window,
      Role::Application
      | Role::Document
      | Role::ScrollArea
      | Role::Toolbar
      | Role::Menu
      | Role::MenuBar
      | Role::MenuItem
      | Role::Tab
      | Role::TabList
      | Role::ListItem
      | Role::Row
      | Role::Cell
      | Role::Link
      | Role::Checkbox
      | Role::RadioButton
      | Role::Slider
      | Role::StaticText
      | Role::Heading
      | Role::Image
      | Role::Unknown => Self::Unknown,
    }
  }

  /// Variant for an element. A failing role query resolves to `Unknown`.
  pub fn of<E: PlatformElement>(element: &E) -> Self {
    match element.role() {
      Ok(role) => Self::for_role(role),
      Err(e) => {
        e.log(&format!("role of {element:?}"));
        Self::Unknown
      }
    }
  }

  /// Notifications a running controller of this kind listens to.
  pub const fn subscriptions(&self) -> &'static [Notification] {
    match self {
      Self::ComboBox => &[Notification::ValueChanged],
      Self::List => &[Notification::SelectedChildrenChanged],
      Self::Table => &[
        Notification::SelectedRowsChanged,
        Notification::SelectedColumnsChanged,
      ],
      Self::TextField | Self::TextArea => &[
        Notification::ValueChanged,
        Notification::SelectedTextChanged,
      ],
      Self::WebArea => &[Notification::SelectedTextChanged],
      Self::Button | Self::Group | Self::Window | Self::Unknown => &[],
    }
  }

  /// Containers stay quiet when they end a focus chain.
  pub const fn narrates_focus(&self) -> bool {
    !matches!(self, Self::Group | Self::WebArea | Self::Window)
  }

  /// Spoken name, also the identifier of focus jobs.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Button => "button",
      Self::ComboBox => "combo box",
      Self::Group => "group",
      Self::List => "list",
      Self::Table => "table",
      Self::TextField => "text field",
      Self::TextArea => "text area",
      Self::WebArea => "web area",
      Self::Window => "window",
      Self::Unknown => "unknown",
    }
  }
}

impl std::fmt::Display for ControllerKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::memory::MemoryPlatform;
  use crate::types::ProcessId;

  #[test]
  fn dedicated_roles_get_dedicated_kinds() {
    assert_eq!(ControllerKind::for_role(Role::Button), ControllerKind::Button);
    assert_eq!(ControllerKind::for_role(Role::SearchField), ControllerKind::TextField);
    assert_eq!(ControllerKind::for_role(Role::GenericGroup), ControllerKind::Group);
    assert_eq!(ControllerKind::for_role(Role::WebArea), ControllerKind::WebArea);
  }

  #[test]
  fn everything_else_is_unknown() {
    assert_eq!(ControllerKind::for_role(Role::Slider), ControllerKind::Unknown);
    assert_eq!(ControllerKind::for_role(Role::Unknown), ControllerKind::Unknown);
  }

  #[test]
  fn dead_elements_are_unknown() {
    let platform = MemoryPlatform::new();
    let app = platform.add_application(ProcessId(1));
    let button = platform.add_child(&app, Role::Button);
    assert_eq!(ControllerKind::of(&button), ControllerKind::Button);

    platform.destroy(&button);
    assert_eq!(ControllerKind::of(&button), ControllerKind::Unknown);
  }

  #[test]
  fn text_inputs_watch_value_and_selection() {
    for kind in [ControllerKind::TextField, ControllerKind::TextArea] {
      assert_eq!(
        kind.subscriptions(),
        &[Notification::ValueChanged, Notification::SelectedTextChanged]
      );
    }
    assert!(ControllerKind::Button.subscriptions().is_empty());
  }

  #[test]
  fn containers_do_not_narrate_focus() {
    assert!(!ControllerKind::Window.narrates_focus());
    assert!(!ControllerKind::Group.narrates_focus());
    assert!(ControllerKind::Unknown.narrates_focus());
  }
}

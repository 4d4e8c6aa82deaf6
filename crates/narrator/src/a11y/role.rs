/*!
Semantic UI roles.

Roles describe what an element *is* in the UI hierarchy, and decide which
controller variant tracks it (see `controller::ControllerKind`).
*/

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Semantic UI role.
///
/// Mirrors the platform's role vocabulary (macOS `AXRole` strings) closely
/// enough that a platform backend can map one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  // === Structural / Containers ===
  Application,
  Window,
  Document,
  WebArea,
  Group,
  ScrollArea,
  Toolbar,

  // === Navigation ===
  Menu,
  MenuBar,
  MenuItem,
  Tab,
  TabList,

  // === Collections ===
  List,
  ListItem,
  Table,
  Row,
  Cell,

  // === Interactive ===
  Button,
  Link,
  TextField,
  TextArea,
  SearchField,
  ComboBox,
  Checkbox,
  RadioButton,
  Slider,

  // === Static content ===
  StaticText,
  Heading,
  Image,

  /// Layout-only container with no label or value.
  GenericGroup,

  /// Platform role didn't map to anything known.
  #[default]
  Unknown,
}

impl Role {
  /// Default spoken role description, used when the platform has none.
  pub const fn description(&self) -> &'static str {
    match self {
      Self::Application => "application",
      Self::Window => "window",
      Self::Document => "document",
      Self::WebArea => "web area",
      Self::Group | Self::GenericGroup => "group",
      Self::ScrollArea => "scroll area",
      Self::Toolbar => "toolbar",
      Self::Menu => "menu",
      Self::MenuBar => "menu bar",
      Self::MenuItem => "menu item",
      Self::Tab => "tab",
      Self::TabList => "tab group",
      Self::List => "list",
      Self::ListItem => "list item",
      Self::Table => "table",
      Self::Row => "row",
      Self::Cell => "cell",
      Self::Button => "button",
      Self::Link => "link",
      Self::TextField => "text field",
      Self::TextArea => "text entry area",
      Self::SearchField => "search text field",
      Self::ComboBox => "combo box",
      Self::Checkbox => "checkbox",
      Self::RadioButton => "radio button",
      Self::Slider => "slider",
      Self::StaticText => "text",
      Self::Heading => "heading",
      Self::Image => "image",
      Self::Unknown => "unknown",
    }
  }
}

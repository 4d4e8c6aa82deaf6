/*! What gets spoken for an element or a change on it. */

use crate::a11y::Notification;
use crate::platform::{Notified, PlatformElement};
use crate::types::NarratorResult;

fn soft<T>(result: NarratorResult<T>, what: &str) -> Option<T> {
  result.map_err(|e| e.log(what)).ok()
}

fn non_empty(s: String) -> Option<String> {
  (!s.is_empty()).then_some(s)
}

fn text_value<E: PlatformElement>(element: &E) -> Option<String> {
  let value = soft(element.value(), "value")?;
  value.as_text().map(str::to_owned)
}

/// Title, falling back to the labelling element's title or text.
fn title<E: PlatformElement>(element: &E) -> Option<String> {
  if let Some(title) = soft(element.title(), "title").and_then(non_empty) {
    return Some(title);
  }
  let label = soft(element.title_ui_element(), "title element")?;
  soft(label.title(), "title")
    .and_then(non_empty)
    .or_else(|| text_value(&label))
}

/// "title, role description, value", skipping whatever is missing.
pub(crate) fn summary<E: PlatformElement>(element: &E) -> Option<String> {
  let parts: Vec<String> = [
    title(element),
    soft(element.role_description(), "role description").and_then(non_empty),
    text_value(element),
  ]
  .into_iter()
  .flatten()
  .collect();

  (!parts.is_empty()).then(|| parts.join(", "))
}

/// Text announcing a change on a running controller's element.
pub(crate) fn announcement<E: PlatformElement>(notified: &Notified<E>) -> Option<String> {
  let element = &notified.element;
  match notified.notification {
    Notification::ValueChanged => text_value(element),
    Notification::TitleChanged => soft(element.title(), "title").and_then(non_empty),
    Notification::SelectedTextChanged => {
      soft(element.selected_text(), "selected text").and_then(non_empty)
    }
    Notification::SelectedChildrenChanged
    | Notification::SelectedRowsChanged
    | Notification::SelectedColumnsChanged => {
      let selected = soft(element.selected_children(), "selected children")?;
      summary(selected.first()?)
    }
    Notification::Destroyed
    | Notification::WindowCreated
    | Notification::FocusedWindowChanged
    | Notification::FocusedUIElementChanged => None,
  }
}

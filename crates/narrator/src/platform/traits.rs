/*!
Platform abstraction traits.

These traits define the contract between core code and platform implementations.
A platform backend (the OS accessibility API, or [`super::memory`]) implements
them; core code only ever sees these traits.
*/

use std::fmt::Debug;
use std::hash::Hash;

use tokio::sync::mpsc;

use crate::a11y::{Notification, Role, Value};
use crate::types::{NarratorError, NarratorResult, ProcessChange, ProcessId};

/// One delivered notification: which element fired, and what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notified<E> {
  /// Element the notification names.
  pub element: E,
  /// What happened.
  pub notification: Notification,
}

/// Per-element operations. Clone is cheap (reference-counted), and equality
/// is identity of the underlying accessibility node.
///
/// Every query is independently failable: elements die underneath us.
pub trait PlatformElement: Clone + Send + Sync + Hash + Eq + Debug + 'static {
  /// Semantic role.
  fn role(&self) -> NarratorResult<Role>;

  /// Parent element, `None` for roots.
  fn parent(&self) -> NarratorResult<Option<Self>>;

  /// Child elements in platform order.
  fn children(&self) -> NarratorResult<Vec<Self>>;

  /// Deepest focused element below this one.
  /// Fails with [`NarratorError::NoValue`] when nothing is focused.
  fn focused_ui_element(&self) -> NarratorResult<Self>;

  /// Windows of an application element.
  fn windows(&self) -> NarratorResult<Vec<Self>> {
    let mut windows = Vec::new();
    for child in self.children()? {
      if matches!(child.role(), Ok(Role::Window)) {
        windows.push(child);
      }
    }
    Ok(windows)
  }

  /// `AXTitle`. Fails with `NoValue` when unset.
  fn title(&self) -> NarratorResult<String>;

  /// Element labelling this one (e.g. a static text next to a field).
  fn title_ui_element(&self) -> NarratorResult<Self>;

  /// Localized role description ("button", "text field").
  fn role_description(&self) -> NarratorResult<String>;

  /// `AXValue`. Fails with `NoValue` when unset.
  fn value(&self) -> NarratorResult<Value>;

  /// Selected children of a list or table.
  fn selected_children(&self) -> NarratorResult<Vec<Self>> {
    Err(NarratorError::AttributeUnsupported("AXSelectedChildren"))
  }

  /// Selected text of a text element.
  fn selected_text(&self) -> NarratorResult<String> {
    Err(NarratorError::AttributeUnsupported("AXSelectedText"))
  }
}

/// Platform-global operations.
pub trait Platform: Send + Sync + 'static {
  /// Element handle type for this platform.
  type Element: PlatformElement;

  /// Check (and optionally prompt for) accessibility permissions.
  fn is_trusted(&self, prompt: bool) -> bool;

  /// Root application element for a process.
  fn application(&self, pid: ProcessId) -> NarratorResult<Self::Element>;

  /// Subscribe to one notification on one element.
  ///
  /// Fails with `NotImplemented`, `NotificationUnsupported`, `InvalidElement`
  /// or `CannotComplete`. Dropping the stream unsubscribes.
  fn subscribe(
    &self,
    element: &Self::Element,
    notification: Notification,
  ) -> NarratorResult<NotificationStream<Self::Element>>;

  /// Diff stream of running applications. The first change is usually a
  /// `Set` snapshot.
  fn running_applications(&self) -> ProcessChanges;
}

/// Asynchronous stream of notifications for one (element, notification) pair.
#[derive(Debug)]
pub struct NotificationStream<E> {
  rx: mpsc::UnboundedReceiver<Notified<E>>,
}

impl<E> NotificationStream<E> {
  /// Wrap the receiving half a platform feeds.
  pub fn new(rx: mpsc::UnboundedReceiver<Notified<E>>) -> Self {
    Self { rx }
  }

  /// Next notification, `None` once the platform side is gone.
  pub async fn next(&mut self) -> Option<Notified<E>> {
    self.rx.recv().await
  }
}

/// Asynchronous stream of running-application changes.
#[derive(Debug)]
pub struct ProcessChanges {
  rx: mpsc::UnboundedReceiver<ProcessChange>,
}

impl ProcessChanges {
  /// Wrap the receiving half a platform feeds.
  pub fn new(rx: mpsc::UnboundedReceiver<ProcessChange>) -> Self {
    Self { rx }
  }

  /// Next change, `None` once the platform side is gone.
  pub async fn next(&mut self) -> Option<ProcessChange> {
    self.rx.recv().await
  }
}

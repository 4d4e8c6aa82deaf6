/*!
In-process desktop implementing [`Platform`].

Build element trees, move focus, post notifications, destroy elements and
drive the running-application diff stream, all without an OS backend.

```
use narrator::a11y::Role;
use narrator::platform::memory::MemoryPlatform;
use narrator::platform::{Platform, PlatformElement};
use narrator::ProcessId;

let platform = MemoryPlatform::new();
let app = platform.add_application(ProcessId(7));
let window = platform.add_child(&app, Role::Window);
let field = platform.add_child(&window, Role::TextField);
platform.set_focused(&app, &field);

assert_eq!(platform.application(ProcessId(7)).unwrap(), app);
assert_eq!(app.focused_ui_element().unwrap(), field);
assert_eq!(field.parent().unwrap(), Some(window));
```
*/

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{NotificationStream, Notified, Platform, PlatformElement, ProcessChanges};
use crate::a11y::{Notification, Role, Value};
use crate::types::{NarratorError, NarratorResult, ProcessChange, ProcessId};

type NodeId = u64;
type Subscriber = mpsc::UnboundedSender<Notified<MemoryElement>>;

#[derive(Debug, Default)]
struct Node {
  role: Role,
  parent: Option<NodeId>,
  children: Vec<NodeId>,
  title: Option<String>,
  title_element: Option<NodeId>,
  role_description: Option<String>,
  value: Option<Value>,
  focused: Option<NodeId>,
  selected_children: Option<Vec<NodeId>>,
  selected_text: Option<String>,
  alive: bool,
}

#[derive(Default)]
struct Desktop {
  next_id: NodeId,
  nodes: HashMap<NodeId, Node>,
  applications: HashMap<ProcessId, NodeId>,
  subscribers: HashMap<(NodeId, Notification), Vec<Subscriber>>,
  subscribe_counts: HashMap<(NodeId, Notification), usize>,
  unsupported: HashSet<(NodeId, Notification)>,
  failing: HashSet<(NodeId, Notification)>,
  processes: Option<mpsc::UnboundedSender<ProcessChange>>,
  pending_changes: Vec<ProcessChange>,
  trusted: bool,
}

impl Desktop {
  fn insert(&mut self, role: Role, parent: Option<NodeId>) -> NodeId {
    self.next_id += 1;
    let id = self.next_id;
    self.nodes.insert(
      id,
      Node {
        role,
        parent,
        alive: true,
        ..Node::default()
      },
    );
    if let Some(node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
      node.children.push(id);
    }
    id
  }

  fn live(&self, id: NodeId) -> NarratorResult<&Node> {
    self
      .nodes
      .get(&id)
      .filter(|n| n.alive)
      .ok_or(NarratorError::InvalidElement)
  }

  fn live_mut(&mut self, id: NodeId) -> Option<&mut Node> {
    self.nodes.get_mut(&id).filter(|n| n.alive)
  }

  /// Deliver to every open subscriber of `(target, notification)`.
  fn deliver(&mut self, target: NodeId, notification: Notification, subject: &MemoryElement) {
    if let Some(senders) = self.subscribers.get_mut(&(target, notification)) {
      senders.retain(|tx| {
        tx.send(Notified {
          element: subject.clone(),
          notification,
        })
        .is_ok()
      });
    }
  }
}

/// In-memory accessibility desktop. Clone shares the same desktop.
#[derive(Clone)]
pub struct MemoryPlatform {
  desktop: Arc<Mutex<Desktop>>,
}

impl std::fmt::Debug for MemoryPlatform {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let desktop = self.desktop.lock();
    f.debug_struct("MemoryPlatform")
      .field("nodes", &desktop.nodes.len())
      .field("applications", &desktop.applications.len())
      .finish_non_exhaustive()
  }
}

impl Default for MemoryPlatform {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryPlatform {
  /// Empty, trusted desktop.
  pub fn new() -> Self {
    Self {
      desktop: Arc::new(Mutex::new(Desktop {
        trusted: true,
        ..Desktop::default()
      })),
    }
  }

  fn element(&self, id: NodeId) -> MemoryElement {
    MemoryElement {
      id,
      desktop: Arc::clone(&self.desktop),
    }
  }

  /// Answer for [`Platform::is_trusted`].
  pub fn set_trusted(&self, trusted: bool) {
    self.desktop.lock().trusted = trusted;
  }

  /// Add an application root element for `pid`.
  pub fn add_application(&self, pid: ProcessId) -> MemoryElement {
    let mut desktop = self.desktop.lock();
    let id = desktop.insert(Role::Application, None);
    desktop.applications.insert(pid, id);
    drop(desktop);
    self.element(id)
  }

  /// Add a child element under `parent`.
  pub fn add_child(&self, parent: &MemoryElement, role: Role) -> MemoryElement {
    let id = self.desktop.lock().insert(role, Some(parent.id));
    self.element(id)
  }

  /// Add a window to `app` and post `WindowCreated` on the application.
  pub fn create_window(&self, app: &MemoryElement) -> MemoryElement {
    let window = self.add_child(app, Role::Window);
    self.post_on(app, Notification::WindowCreated, &window);
    window
  }

  /// Record `element` as the focused element of `app`, silently.
  pub fn set_focused(&self, app: &MemoryElement, element: &MemoryElement) {
    if let Some(node) = self.desktop.lock().live_mut(app.id) {
      node.focused = Some(element.id);
    }
  }

  /// Clear the focused element of `app`.
  pub fn clear_focus(&self, app: &MemoryElement) {
    if let Some(node) = self.desktop.lock().live_mut(app.id) {
      node.focused = None;
    }
  }

  /// Move focus and post `FocusedUIElementChanged` on the application.
  pub fn focus(&self, app: &MemoryElement, element: &MemoryElement) {
    self.set_focused(app, element);
    self.post_on(app, Notification::FocusedUIElementChanged, element);
  }

  /// Post `notification` on `element` itself.
  pub fn post(&self, element: &MemoryElement, notification: Notification) {
    self.post_on(element, notification, element);
  }

  /// Post `notification` on `target`, naming `subject` as the element that changed.
  pub fn post_on(&self, target: &MemoryElement, notification: Notification, subject: &MemoryElement) {
    self
      .desktop
      .lock()
      .deliver(target.id, notification, subject);
  }

  /// Destroy `element` and its descendants, posting `Destroyed` on each.
  /// Subscriptions on destroyed elements end after the notification.
  pub fn destroy(&self, element: &MemoryElement) {
    let mut desktop = self.desktop.lock();
    if let Some(parent) = desktop.nodes.get(&element.id).and_then(|n| n.parent) {
      if let Some(node) = desktop.nodes.get_mut(&parent) {
        node.children.retain(|c| *c != element.id);
      }
    }

    let mut pending = vec![element.id];
    while let Some(id) = pending.pop() {
      let Some(node) = desktop.live_mut(id) else {
        continue;
      };
      node.alive = false;
      pending.extend(node.children.iter().copied());

      let subject = self.element(id);
      desktop.deliver(id, Notification::Destroyed, &subject);
      desktop.subscribers.retain(|(node_id, _), _| *node_id != id);
    }
  }

  /// Make subscribing to `notification` on `element` fail as unsupported.
  pub fn set_unsupported(&self, element: &MemoryElement, notification: Notification) {
    self
      .desktop
      .lock()
      .unsupported
      .insert((element.id, notification));
  }

  /// Make subscribing to `notification` on `element` fail with `CannotComplete`.
  pub fn set_failing(&self, element: &MemoryElement, notification: Notification) {
    self.desktop.lock().failing.insert((element.id, notification));
  }

  /// Subscriptions on `(element, notification)` whose stream is still alive.
  pub fn active_subscriptions(&self, element: &MemoryElement, notification: Notification) -> usize {
    self
      .desktop
      .lock()
      .subscribers
      .get(&(element.id, notification))
      .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
  }

  /// Total successful subscribe calls ever made on `(element, notification)`.
  pub fn subscription_count(&self, element: &MemoryElement, notification: Notification) -> usize {
    self
      .desktop
      .lock()
      .subscribe_counts
      .get(&(element.id, notification))
      .copied()
      .unwrap_or(0)
  }

  /// Push a change onto the running-applications stream. Changes sent before
  /// anyone listens are buffered.
  pub fn send_process_change(&self, change: ProcessChange) {
    let mut desktop = self.desktop.lock();
    let undelivered = match &desktop.processes {
      Some(tx) => tx.send(change).err().map(|e| e.0),
      None => Some(change),
    };
    if let Some(change) = undelivered {
      desktop.pending_changes.push(change);
    }
  }
}

impl Platform for MemoryPlatform {
  type Element = MemoryElement;

  fn is_trusted(&self, _prompt: bool) -> bool {
    self.desktop.lock().trusted
  }

  fn application(&self, pid: ProcessId) -> NarratorResult<MemoryElement> {
    let id = self
      .desktop
      .lock()
      .applications
      .get(&pid)
      .copied()
      .ok_or(NarratorError::ProcessNotFound(pid))?;
    Ok(self.element(id))
  }

  fn subscribe(
    &self,
    element: &MemoryElement,
    notification: Notification,
  ) -> NarratorResult<NotificationStream<MemoryElement>> {
    let mut desktop = self.desktop.lock();
    desktop.live(element.id)?;
    let key = (element.id, notification);
    if desktop.unsupported.contains(&key) {
      return Err(NarratorError::NotificationUnsupported(notification));
    }
    if desktop.failing.contains(&key) {
      return Err(NarratorError::CannotComplete);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    desktop.subscribers.entry(key).or_default().push(tx);
    *desktop.subscribe_counts.entry(key).or_default() += 1;
    Ok(NotificationStream::new(rx))
  }

  fn running_applications(&self) -> ProcessChanges {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut desktop = self.desktop.lock();
    for change in desktop.pending_changes.drain(..) {
      if tx.send(change).is_err() {
        break;
      }
    }
    desktop.processes = Some(tx);
    ProcessChanges::new(rx)
  }
}

/// Handle to one node of a [`MemoryPlatform`]. Equality is node identity.
#[derive(Clone)]
pub struct MemoryElement {
  id: NodeId,
  desktop: Arc<Mutex<Desktop>>,
}

impl std::fmt::Debug for MemoryElement {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemoryElement")
      .field("id", &self.id)
      .finish_non_exhaustive()
  }
}

impl PartialEq for MemoryElement {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for MemoryElement {}

impl Hash for MemoryElement {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl MemoryElement {
  fn sibling(&self, id: NodeId) -> Self {
    Self {
      id,
      desktop: Arc::clone(&self.desktop),
    }
  }

  fn read<T>(&self, f: impl FnOnce(&Node) -> NarratorResult<T>) -> NarratorResult<T> {
    let desktop = self.desktop.lock();
    f(desktop.live(self.id)?)
  }

  fn write(&self, f: impl FnOnce(&mut Node)) {
    if let Some(node) = self.desktop.lock().live_mut(self.id) {
      f(node);
    }
  }

  /// Set `AXTitle`.
  pub fn set_title(&self, title: impl Into<String>) {
    let title = title.into();
    self.write(|n| n.title = Some(title));
  }

  /// Set the labelling element.
  pub fn set_title_element(&self, label: &Self) {
    self.write(|n| n.title_element = Some(label.id));
  }

  /// Override the role description.
  pub fn set_role_description(&self, description: impl Into<String>) {
    let description = description.into();
    self.write(|n| n.role_description = Some(description));
  }

  /// Set `AXValue`.
  pub fn set_value(&self, value: impl Into<Value>) {
    let value = value.into();
    self.write(|n| n.value = Some(value));
  }

  /// Set the selection of a list or table.
  pub fn set_selected_children(&self, selected: &[Self]) {
    let ids = selected.iter().map(|e| e.id).collect();
    self.write(|n| n.selected_children = Some(ids));
  }

  /// Set the text selection.
  pub fn set_selected_text(&self, text: impl Into<String>) {
    let text = text.into();
    self.write(|n| n.selected_text = Some(text));
  }
}

impl PlatformElement for MemoryElement {
  fn role(&self) -> NarratorResult<Role> {
    self.read(|n| Ok(n.role))
  }

  fn parent(&self) -> NarratorResult<Option<Self>> {
    self.read(|n| Ok(n.parent.map(|p| self.sibling(p))))
  }

  fn children(&self) -> NarratorResult<Vec<Self>> {
    self.read(|n| Ok(n.children.iter().map(|c| self.sibling(*c)).collect()))
  }

  fn focused_ui_element(&self) -> NarratorResult<Self> {
    self.read(|n| {
      n.focused
        .map(|f| self.sibling(f))
        .ok_or(NarratorError::NoValue)
    })
  }

  fn title(&self) -> NarratorResult<String> {
    self.read(|n| n.title.clone().ok_or(NarratorError::NoValue))
  }

  fn title_ui_element(&self) -> NarratorResult<Self> {
    self.read(|n| {
      n.title_element
        .map(|t| self.sibling(t))
        .ok_or(NarratorError::NoValue)
    })
  }

  fn role_description(&self) -> NarratorResult<String> {
    self.read(|n| {
      Ok(
        n.role_description
          .clone()
          .unwrap_or_else(|| n.role.description().to_owned()),
      )
    })
  }

  fn value(&self) -> NarratorResult<Value> {
    self.read(|n| n.value.clone().ok_or(NarratorError::NoValue))
  }

  fn selected_children(&self) -> NarratorResult<Vec<Self>> {
    self.read(|n| {
      n.selected_children
        .as_ref()
        .map(|ids| ids.iter().map(|c| self.sibling(*c)).collect())
        .ok_or(NarratorError::AttributeUnsupported("AXSelectedChildren"))
    })
  }

  fn selected_text(&self) -> NarratorResult<String> {
    self.read(|n| {
      n.selected_text
        .clone()
        .ok_or(NarratorError::AttributeUnsupported("AXSelectedText"))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod tree_tests {
    use super::*;

    #[test]
    fn windows_are_window_role_children() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let window = platform.add_child(&app, Role::Window);
      platform.add_child(&app, Role::MenuBar);

      assert_eq!(app.windows().unwrap(), vec![window]);
    }

    #[test]
    fn unknown_pid_is_not_found() {
      let platform = MemoryPlatform::new();
      assert_eq!(
        platform.application(ProcessId(99)).unwrap_err(),
        NarratorError::ProcessNotFound(ProcessId(99))
      );
    }

    #[test]
    fn nothing_focused_is_no_value() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      assert_eq!(app.focused_ui_element().unwrap_err(), NarratorError::NoValue);
    }

    #[test]
    fn destroyed_elements_are_invalid() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let window = platform.add_child(&app, Role::Window);
      let button = platform.add_child(&window, Role::Button);

      platform.destroy(&window);

      assert_eq!(button.role().unwrap_err(), NarratorError::InvalidElement);
      assert!(app.children().unwrap().is_empty());
    }

    #[test]
    fn role_description_falls_back_to_role() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let field = platform.add_child(&app, Role::SearchField);
      assert_eq!(field.role_description().unwrap(), "search text field");
      field.set_role_description("search");
      assert_eq!(field.role_description().unwrap(), "search");
    }
  }

  mod notification_tests {
    use super::*;

    #[tokio::test]
    async fn posts_reach_subscribers() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let field = platform.add_child(&app, Role::TextField);

      let mut stream = platform.subscribe(&app, Notification::FocusedUIElementChanged).unwrap();
      platform.focus(&app, &field);

      let notified = stream.next().await.unwrap();
      assert_eq!(notified.element, field);
      assert_eq!(notified.notification, Notification::FocusedUIElementChanged);
    }

    #[tokio::test]
    async fn destroy_delivers_then_ends_stream() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let button = platform.add_child(&app, Role::Button);

      let mut stream = platform.subscribe(&button, Notification::Destroyed).unwrap();
      platform.destroy(&button);

      assert_eq!(stream.next().await.unwrap().element, button);
      assert!(stream.next().await.is_none());
    }

    #[test]
    fn dropped_streams_are_inactive() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));

      let stream = platform.subscribe(&app, Notification::WindowCreated).unwrap();
      assert_eq!(platform.active_subscriptions(&app, Notification::WindowCreated), 1);
      drop(stream);
      assert_eq!(platform.active_subscriptions(&app, Notification::WindowCreated), 0);
      assert_eq!(platform.subscription_count(&app, Notification::WindowCreated), 1);
    }

    #[test]
    fn subscribe_failures() {
      let platform = MemoryPlatform::new();
      let app = platform.add_application(ProcessId(1));
      let list = platform.add_child(&app, Role::List);
      platform.set_unsupported(&list, Notification::SelectedChildrenChanged);
      platform.set_failing(&list, Notification::Destroyed);

      assert_eq!(
        platform
          .subscribe(&list, Notification::SelectedChildrenChanged)
          .unwrap_err(),
        NarratorError::NotificationUnsupported(Notification::SelectedChildrenChanged)
      );
      assert_eq!(
        platform.subscribe(&list, Notification::Destroyed).unwrap_err(),
        NarratorError::CannotComplete
      );

      platform.destroy(&list);
      assert_eq!(
        platform.subscribe(&list, Notification::ValueChanged).unwrap_err(),
        NarratorError::InvalidElement
      );
    }

    #[tokio::test]
    async fn process_changes_buffer_until_listened() {
      let platform = MemoryPlatform::new();
      let change = ProcessChange::Insert(vec![]);
      platform.send_process_change(change.clone());

      let mut changes = platform.running_applications();
      assert_eq!(changes.next().await, Some(change));
    }
  }
}

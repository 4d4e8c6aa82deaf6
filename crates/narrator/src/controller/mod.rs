/*!
Per-element controllers.

A [`Controller`] tracks one focusable element. Starting it subscribes to the
notifications its [`ControllerKind`] cares about; stopping it cancels them.
Controllers reach their application only through a [`JobSender`], so nothing
a controller owns points back at the application or hierarchy.
*/

mod kind;
mod narration;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use kind::ControllerKind;

use crate::a11y::Notification;
use crate::output::{Job, JobSender};
use crate::platform::Platform;
use crate::subscription::Subscription;
use crate::types::{NarratorError, NarratorResult};

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
  /// No subscriptions held.
  #[default]
  Stopped,
  /// Subscriptions acquired; changes are announced.
  Running,
}

/// What every controller of one application shares.
pub(crate) struct ControllerContext<P: Platform> {
  pub(crate) platform: Arc<P>,
  pub(crate) jobs: JobSender,
}

impl<P: Platform> Clone for ControllerContext<P> {
  fn clone(&self) -> Self {
    Self {
      platform: Arc::clone(&self.platform),
      jobs: self.jobs.clone(),
    }
  }
}

#[derive(Debug, Default)]
struct ControllerState {
  run_state: RunState,
  subscriptions: Vec<Subscription>,
}

struct ControllerInner<P: Platform> {
  element: P::Element,
  kind: ControllerKind,
  context: ControllerContext<P>,
  state: Mutex<ControllerState>,
}

/// Handle to a controller. Clone is cheap and shares the same controller.
pub struct Controller<P: Platform> {
  inner: Arc<ControllerInner<P>>,
}

impl<P: Platform> Clone for Controller<P> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<P: Platform> std::fmt::Debug for Controller<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Controller")
      .field("kind", &self.inner.kind)
      .field("element", &self.inner.element)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> Controller<P> {
  /// Build the controller variant for `element`.
  pub(crate) fn new(element: P::Element, context: ControllerContext<P>) -> Self {
    let kind = ControllerKind::of(&element);
    Self {
      inner: Arc::new(ControllerInner {
        element,
        kind,
        context,
        state: Mutex::new(ControllerState::default()),
      }),
    }
  }

  /// Element this controller tracks.
  pub fn element(&self) -> &P::Element {
    &self.inner.element
  }

  /// Variant chosen from the element's role.
  pub fn kind(&self) -> ControllerKind {
    self.inner.kind
  }

  /// Current lifecycle state.
  pub async fn run_state(&self) -> RunState {
    self.inner.state.lock().await.run_state
  }

  /// Same controller instance (not merely the same element).
  pub fn is(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  /// Acquire this variant's subscriptions. No-op when running.
  ///
  /// Unsupported notifications are skipped. Any other failure releases what
  /// was acquired and leaves the controller stopped.
  pub async fn start(&self) -> NarratorResult<()> {
    let mut state = self.inner.state.lock().await;
    if state.run_state == RunState::Running {
      return Ok(());
    }

    let mut acquired = Vec::new();
    for &notification in self.inner.kind.subscriptions() {
      match self.subscribe(notification) {
        Ok(subscription) => acquired.push(subscription),
        Err(e @ NarratorError::NotificationUnsupported(_)) => {
          e.log(&format!("{} start", self.inner.kind));
        }
        Err(e) => {
          log::warn!("{self:?} failed to start: {e}");
          return Err(e);
        }
      }
    }

    log::debug!("{self:?} started");
    state.subscriptions = acquired;
    state.run_state = RunState::Running;
    Ok(())
  }

  /// Cancel every subscription. No-op when stopped.
  pub async fn stop(&self) {
    let mut state = self.inner.state.lock().await;
    if state.run_state == RunState::Stopped {
      return;
    }
    for mut subscription in state.subscriptions.drain(..) {
      subscription.cancel();
    }
    state.run_state = RunState::Stopped;
    log::debug!("{self:?} stopped");
  }

  /// This controller's element became the focused leaf.
  pub fn focus(&self) {
    let kind = self.inner.kind;
    if !kind.narrates_focus() {
      return;
    }
    match narration::summary(&self.inner.element) {
      Some(text) => self.inner.context.jobs.send(Job::focus(kind.name(), text)),
      None => log::debug!("{self:?} has nothing to narrate"),
    }
  }

  fn subscribe(&self, notification: Notification) -> NarratorResult<Subscription> {
    let stream = self
      .inner
      .context
      .platform
      .subscribe(&self.inner.element, notification)?;

    let kind = self.inner.kind;
    let jobs = self.inner.context.jobs.clone();
    Ok(Subscription::spawn(notification, stream, move |notified| {
      log::trace!("{kind} received {}", notified.notification);
      if let Some(text) = narration::announcement(&notified) {
        jobs.send(Job::announcement(notified.notification.platform_name(), text));
      }
      std::future::ready(())
    }))
  }

  #[cfg(test)]
  pub(crate) async fn subscribed(&self) -> Vec<Notification> {
    let state = self.inner.state.lock().await;
    state.subscriptions.iter().map(Subscription::notification).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::a11y::Role;
  use crate::output::{JobQueue, JobReceiver};
  use crate::platform::memory::{MemoryElement, MemoryPlatform};
  use crate::testing::wait_until;
  use crate::types::ProcessId;
  use std::time::Duration;

  struct Fixture {
    platform: Arc<MemoryPlatform>,
    app: MemoryElement,
    queue: JobQueue,
    jobs: JobReceiver,
  }

  impl Fixture {
    fn new() -> Self {
      let platform = Arc::new(MemoryPlatform::new());
      let app = platform.add_application(ProcessId(1));
      let queue = JobQueue::new();
      let jobs = queue.subscribe();
      Self {
        platform,
        app,
        queue,
        jobs,
      }
    }

    fn controller(&self, role: Role) -> (MemoryElement, Controller<MemoryPlatform>) {
      let element = self.platform.add_child(&self.app, role);
      let context = ControllerContext {
        platform: Arc::clone(&self.platform),
        jobs: self.queue.sender(),
      };
      (element.clone(), Controller::new(element, context))
    }

    async fn next_job(&mut self) -> Option<Arc<Job>> {
      tokio::time::timeout(Duration::from_millis(200), self.jobs.recv())
        .await
        .ok()
        .flatten()
    }
  }

  mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn start_subscribes_per_kind() {
      let fx = Fixture::new();
      let (table, controller) = fx.controller(Role::Table);

      controller.start().await.unwrap();

      assert_eq!(controller.run_state().await, RunState::Running);
      assert_eq!(
        controller.subscribed().await,
        vec![
          Notification::SelectedRowsChanged,
          Notification::SelectedColumnsChanged
        ]
      );
      assert_eq!(
        fx.platform
          .active_subscriptions(&table, Notification::SelectedRowsChanged),
        1
      );
    }

    #[tokio::test]
    async fn start_twice_subscribes_once() {
      let fx = Fixture::new();
      let (field, controller) = fx.controller(Role::TextField);

      controller.start().await.unwrap();
      controller.start().await.unwrap();

      assert_eq!(
        fx.platform.subscription_count(&field, Notification::ValueChanged),
        1
      );
    }

    #[tokio::test]
    async fn stop_cancels_subscriptions() {
      let fx = Fixture::new();
      let (field, controller) = fx.controller(Role::TextArea);
      controller.start().await.unwrap();

      controller.stop().await;

      assert_eq!(controller.run_state().await, RunState::Stopped);
      assert!(controller.subscribed().await.is_empty());
      let platform = Arc::clone(&fx.platform);
      wait_until("subscriptions to close", || {
        let active = platform.active_subscriptions(&field, Notification::ValueChanged)
          + platform.active_subscriptions(&field, Notification::SelectedTextChanged);
        std::future::ready(active == 0)
      })
      .await;
    }

    #[tokio::test]
    async fn stop_while_stopped_is_a_no_op() {
      let fx = Fixture::new();
      let (_, controller) = fx.controller(Role::Button);

      controller.stop().await;
      controller.stop().await;

      assert_eq!(controller.run_state().await, RunState::Stopped);
    }

    #[tokio::test]
    async fn unsupported_notifications_are_skipped() {
      let fx = Fixture::new();
      let (field, controller) = fx.controller(Role::TextField);
      fx.platform
        .set_unsupported(&field, Notification::SelectedTextChanged);

      controller.start().await.unwrap();

      assert_eq!(controller.run_state().await, RunState::Running);
      assert_eq!(controller.subscribed().await, vec![Notification::ValueChanged]);
    }

    #[tokio::test]
    async fn other_failures_release_and_stay_stopped() {
      let fx = Fixture::new();
      let (field, controller) = fx.controller(Role::TextField);
      fx.platform
        .set_failing(&field, Notification::SelectedTextChanged);

      let err = controller.start().await.unwrap_err();

      assert_eq!(err, NarratorError::CannotComplete);
      assert_eq!(controller.run_state().await, RunState::Stopped);
      let platform = Arc::clone(&fx.platform);
      wait_until("acquired subscription to close", || {
        std::future::ready(platform.active_subscriptions(&field, Notification::ValueChanged) == 0)
      })
      .await;
    }

    #[tokio::test]
    async fn clones_are_the_same_controller() {
      let fx = Fixture::new();
      let (element, controller) = fx.controller(Role::Button);
      let (_, other) = fx.controller(Role::Button);

      assert!(controller.is(&controller.clone()));
      assert!(!controller.is(&other));
      assert_eq!(controller.element(), &element);
    }
  }

  mod narration_tests {
    use super::*;

    #[tokio::test]
    async fn focus_narrates_with_interrupt() {
      let mut fx = Fixture::new();
      let (button, controller) = fx.controller(Role::Button);
      button.set_title("OK");

      controller.focus();

      let job = fx.next_job().await.unwrap();
      assert!(job.options.interrupt);
      assert_eq!(job.spoken_text(), "OK, button");
    }

    #[tokio::test]
    async fn containers_focus_silently() {
      let mut fx = Fixture::new();
      let (_, controller) = fx.controller(Role::Window);

      controller.focus();

      assert!(fx.next_job().await.is_none());
    }

    #[tokio::test]
    async fn running_controllers_announce_changes() {
      let mut fx = Fixture::new();
      let (field, controller) = fx.controller(Role::TextField);
      controller.start().await.unwrap();

      field.set_value("hello");
      fx.platform.post(&field, Notification::ValueChanged);

      let job = fx.next_job().await.unwrap();
      assert!(!job.options.interrupt);
      assert_eq!(job.spoken_text(), "hello");
    }

    #[tokio::test]
    async fn stopped_controllers_stay_quiet() {
      let mut fx = Fixture::new();
      let (field, controller) = fx.controller(Role::ComboBox);
      controller.start().await.unwrap();
      controller.stop().await;

      field.set_value("Large");
      fx.platform.post(&field, Notification::ValueChanged);

      assert!(fx.next_job().await.is_none());
    }
  }
}

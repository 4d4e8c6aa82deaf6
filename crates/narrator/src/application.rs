/*!
Top-level controller for one OS process.

An [`Application`] owns the process's [`ControllerHierarchy`] and its job
queue. While running it listens on the application element for window and
focus changes, and forwards queued jobs to its output.
*/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::a11y::Notification;
use crate::controller::{ControllerContext, RunState};
use crate::hierarchy::ControllerHierarchy;
use crate::output::{JobQueue, OutputSink};
use crate::platform::{Notified, Platform, PlatformElement};
use crate::subscription::Subscription;
use crate::types::{NarratorResult, ProcessId};

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Default)]
struct ApplicationState {
  run_state: RunState,
  subscriptions: Vec<Subscription>,
  forwarder: Option<JoinHandle<()>>,
}

impl Drop for ApplicationState {
  fn drop(&mut self) {
    if let Some(forwarder) = self.forwarder.take() {
      forwarder.abort();
    }
  }
}

/// One process's screen reader.
pub struct Application<P: Platform> {
  pid: ProcessId,
  platform: Arc<P>,
  root: P::Element,
  hierarchy: ControllerHierarchy<P>,
  queue: JobQueue,
  output: Arc<dyn OutputSink>,
  state: Mutex<ApplicationState>,
}

impl<P: Platform> std::fmt::Debug for Application<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Application")
      .field("pid", &self.pid)
      .field("root", &self.root)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> Application<P> {
  /// Resolve the application element for `pid`. Nothing starts yet.
  pub fn new(platform: Arc<P>, pid: ProcessId, output: Arc<dyn OutputSink>) -> NarratorResult<Self> {
    let root = platform.application(pid)?;
    let queue = JobQueue::new();
    let hierarchy = ControllerHierarchy::new(ControllerContext {
      platform: Arc::clone(&platform),
      jobs: queue.sender(),
    });
    Ok(Self {
      pid,
      platform,
      root,
      hierarchy,
      queue,
      output,
      state: Mutex::new(ApplicationState::default()),
    })
  }

  /// Process this application narrates.
  pub const fn pid(&self) -> ProcessId {
    self.pid
  }

  /// Application root element.
  pub const fn root(&self) -> &P::Element {
    &self.root
  }

  /// Controllers of this process.
  pub const fn hierarchy(&self) -> &ControllerHierarchy<P> {
    &self.hierarchy
  }

  /// Whether root subscriptions and forwarding are live.
  pub async fn run_state(&self) -> RunState {
    self.state.lock().await.run_state
  }

  /// Start forwarding jobs, listen for window and focus changes, register
  /// existing windows and narrate the initial focus. No-op when running.
  ///
  /// Subscriptions that fail are logged and skipped.
  pub async fn start(&self) {
    let mut state = self.state.lock().await;
    if state.run_state == RunState::Running {
      return;
    }
    log::info!("starting {self:?}");

    state.forwarder = Some(self.spawn_forwarder());

    for &notification in Notification::APPLICATION {
      match self.platform.subscribe(&self.root, notification) {
        Ok(stream) => state
          .subscriptions
          .push(Subscription::spawn(notification, stream, self.root_handler())),
        Err(e) => e.log(&format!("pid {} {notification}", self.pid)),
      }
    }

    match self.root.windows() {
      Ok(windows) => {
        for window in windows {
          if let Err(e) = self.hierarchy.register_window(&window).await {
            e.log(&format!("registering {window:?}"));
          }
        }
      }
      Err(e) => e.log(&format!("windows of pid {}", self.pid)),
    }

    self.hierarchy.focus(&self.root, &self.root).await;
    state.run_state = RunState::Running;
  }

  /// Cancel root subscriptions and job forwarding. Once this returns, no job
  /// reaches the output. Child controllers are left as they are.
  pub async fn stop(&self) {
    let mut state = self.state.lock().await;
    if state.run_state == RunState::Stopped {
      return;
    }
    log::info!("stopping {self:?}");

    for mut subscription in state.subscriptions.drain(..) {
      subscription.cancel();
    }
    if let Some(forwarder) = state.forwarder.take() {
      forwarder.abort();
      if let Err(e) = forwarder.await {
        if !e.is_cancelled() {
          log::warn!("job forwarder for pid {} failed: {e}", self.pid);
        }
      }
    }
    state.run_state = RunState::Stopped;
  }

  fn spawn_forwarder(&self) -> JoinHandle<()> {
    let mut jobs = self.queue.subscribe();
    let output = Arc::clone(&self.output);
    tokio::spawn(async move {
      while let Some(job) = jobs.recv().await {
        if let Err(e) = output.submit(&job).await {
          e.log("output");
        }
      }
    })
  }

  fn root_handler(&self) -> impl FnMut(Notified<P::Element>) -> BoxFuture + Send + 'static {
    let hierarchy = self.hierarchy.clone();
    let root = self.root.clone();
    move |notified| {
      let hierarchy = hierarchy.clone();
      let root = root.clone();
      Box::pin(async move {
        log::debug!("{} on {:?}", notified.notification, notified.element);
        if notified.notification == Notification::WindowCreated {
          if let Err(e) = hierarchy.register_window(&notified.element).await {
            e.log(&format!("registering {:?}", notified.element));
          }
        }
        hierarchy.focus(&root, &notified.element).await;
      })
    }
  }
}

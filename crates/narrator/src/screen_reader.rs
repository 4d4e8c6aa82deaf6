/*!
The screen reader: follows the running-application stream and keeps one
server per admitted process.

```
use std::sync::Arc;
use narrator::platform::memory::MemoryPlatform;
use narrator::ScreenReader;

#[tokio::main(flavor = "current_thread")]
async fn main() {
  let platform = Arc::new(MemoryPlatform::new());
  let reader = ScreenReader::builder(platform)
    .exclude("com.example.noisy")
    .build();

  reader.confirm_trust().unwrap();
  reader.start().await;
  assert!(reader.running().await.is_empty());
  reader.stop().await;
}
```
*/

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::fleet::{Fleet, ServerProvider};
use crate::output::{Output, OutputSink, TextLog};
use crate::platform::Platform;
use crate::types::{BundleIdentifier, NarratorError, NarratorResult, ProcessId, RunningApplicationKey};

struct ReconcileTask {
  handle: JoinHandle<()>,
  cancel: CancellationToken,
}

/// Screen reader for every running application on one platform.
///
/// Dropping it cancels the reconcile loop.
pub struct ScreenReader<P: Platform> {
  platform: Arc<P>,
  config: Config,
  fleet: Arc<tokio::sync::Mutex<Fleet<P>>>,
  task: Mutex<Option<ReconcileTask>>,
}

impl<P: Platform> std::fmt::Debug for ScreenReader<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScreenReader")
      .field("config", &self.config)
      .field("started", &self.task.lock().is_some())
      .finish_non_exhaustive()
  }
}

/// Builder for configuring a [`ScreenReader`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use narrator::platform::memory::MemoryPlatform;
/// use narrator::output::TextLog;
/// use narrator::{Config, ScreenReader};
///
/// let reader = ScreenReader::builder(Arc::new(MemoryPlatform::new()))
///   .config(Config::default())
///   .include("com.apple.TextEdit")
///   .sink(TextLog)
///   .build();
/// ```
#[must_use = "Builder does nothing until .build() is called"]
pub struct ScreenReaderBuilder<P: Platform> {
  platform: Arc<P>,
  config: Config,
  sinks: Vec<Arc<dyn OutputSink>>,
  own_pid: ProcessId,
}

impl<P: Platform> std::fmt::Debug for ScreenReaderBuilder<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScreenReaderBuilder")
      .field("config", &self.config)
      .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
      .field("own_pid", &self.own_pid)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> ScreenReaderBuilder<P> {
  /// Replace the whole config.
  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Narrate this application (once any are included, only those are).
  pub fn include(mut self, bundle: impl Into<BundleIdentifier>) -> Self {
    self.config.inclusion_list.push(bundle.into());
    self
  }

  /// Never narrate this application.
  pub fn exclude(mut self, bundle: impl Into<BundleIdentifier>) -> Self {
    self.config.exclusion_list.push(bundle.into());
    self
  }

  /// Whether `confirm_trust` asks the OS to prompt.
  pub fn prompt_for_trust(mut self, prompt: bool) -> Self {
    self.config.prompt_for_trust = prompt;
    self
  }

  /// Add an output sink. Without any, narration goes to [`TextLog`].
  pub fn sink(mut self, sink: impl OutputSink + 'static) -> Self {
    self.sinks.push(Arc::new(sink));
    self
  }

  /// The process never admitted. Default: the current process.
  pub fn own_pid(mut self, pid: ProcessId) -> Self {
    self.own_pid = pid;
    self
  }

  /// Finish. Without sinks, narration goes to [`TextLog`].
  pub fn build(self) -> ScreenReader<P> {
    let output = if self.sinks.is_empty() {
      Output::default().with_sink(TextLog)
    } else {
      Output::new(self.sinks)
    };
    let provider = ServerProvider::new(
      Arc::clone(&self.platform),
      Arc::new(output),
      &self.config,
      self.own_pid,
    );
    ScreenReader {
      platform: self.platform,
      config: self.config,
      fleet: Arc::new(tokio::sync::Mutex::new(Fleet::new(provider))),
      task: Mutex::new(None),
    }
  }
}

impl<P: Platform> ScreenReader<P> {
  /// Screen reader with the default config and the text log as output.
  pub fn new(platform: Arc<P>) -> Self {
    Self::builder(platform).build()
  }

  /// Start configuring a screen reader for `platform`.
  pub fn builder(platform: Arc<P>) -> ScreenReaderBuilder<P> {
    ScreenReaderBuilder {
      platform,
      config: Config::default(),
      sinks: Vec::new(),
      own_pid: ProcessId::current(),
    }
  }

  /// Effective configuration.
  pub const fn config(&self) -> &Config {
    &self.config
  }

  /// Check accessibility permission, prompting if configured to.
  ///
  /// Hosts should exit when this fails: nothing can be narrated.
  pub fn confirm_trust(&self) -> NarratorResult<()> {
    if self.platform.is_trusted(self.config.prompt_for_trust) {
      Ok(())
    } else {
      let err = NarratorError::PermissionDenied;
      err.log("confirm trust");
      Err(err)
    }
  }

  /// Follow the running-application stream. Restarts the loop when already
  /// started; servers already running are kept.
  pub async fn start(&self) {
    self.cancel_task().await;

    let mut changes = self.platform.running_applications();
    let fleet = Arc::clone(&self.fleet);
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
      loop {
        tokio::select! {
          () = token.cancelled() => break,
          change = changes.next() => {
            let Some(change) = change else {
              log::info!("running-application stream ended");
              break;
            };
            fleet.lock().await.apply(change).await;
          }
        }
      }
    });

    *self.task.lock() = Some(ReconcileTask { handle, cancel });
    log::info!("screen reader started");
  }

  /// Stop following processes and stop every server.
  pub async fn stop(&self) {
    self.cancel_task().await;
    self.fleet.lock().await.stop_all().await;
    log::info!("screen reader stopped");
  }

  /// Keys of the processes currently narrated, sorted.
  pub async fn running(&self) -> Vec<RunningApplicationKey> {
    self.fleet.lock().await.keys()
  }

  async fn cancel_task(&self) {
    let task = self.task.lock().take();
    if let Some(task) = task {
      task.cancel.cancel();
      if let Err(e) = task.handle.await {
        log::warn!("reconcile loop failed: {e}");
      }
    }
  }
}

impl<P: Platform> Drop for ScreenReader<P> {
  fn drop(&mut self) {
    if let Some(task) = self.task.get_mut().take() {
      task.cancel.cancel();
    }
  }
}

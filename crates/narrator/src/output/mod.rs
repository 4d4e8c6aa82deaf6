/*!
Output dispatch.

An [`Output`] fans each [`Job`] out to its sinks in order. Speech and braille
engines live outside this crate and plug in as [`OutputSink`]s; [`TextLog`]
is built in.
*/

mod job;
mod queue;
mod text;

use std::sync::Arc;

use async_trait::async_trait;

pub use job::{Job, JobOptions, Payload};
pub use queue::{JobQueue, JobReceiver, JobSender};
pub use text::TextLog;

use crate::types::{NarratorError, NarratorResult, SinkFailure};

/// A narration channel (speech, braille, text).
#[async_trait]
pub trait OutputSink: Send + Sync {
  /// Short name used in logs and aggregated errors.
  fn name(&self) -> &'static str;

  /// Deliver one job.
  async fn submit(&self, job: &Job) -> NarratorResult<()>;
}

/// Ordered set of sinks. Every sink receives every job, even when an
/// earlier one fails; failures are reported together.
#[derive(Clone, Default)]
pub struct Output {
  sinks: Vec<Arc<dyn OutputSink>>,
}

impl std::fmt::Debug for Output {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Output")
      .field("sinks", &self.names())
      .finish()
  }
}

impl Output {
  /// Sinks in dispatch order.
  pub fn new(sinks: Vec<Arc<dyn OutputSink>>) -> Self {
    Self { sinks }
  }

  /// Append a sink.
  #[must_use]
  pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
    self.sinks.push(Arc::new(sink));
    self
  }

  /// Sink names in dispatch order.
  pub fn names(&self) -> Vec<&'static str> {
    self.sinks.iter().map(|s| s.name()).collect()
  }

  /// Number of sinks.
  pub fn len(&self) -> usize {
    self.sinks.len()
  }

  /// True when there are no sinks.
  pub fn is_empty(&self) -> bool {
    self.sinks.is_empty()
  }
}

#[async_trait]
impl OutputSink for Output {
  fn name(&self) -> &'static str {
    "output"
  }

  async fn submit(&self, job: &Job) -> NarratorResult<()> {
    log::debug!("{job}");
    let mut failures = Vec::new();
    for sink in &self.sinks {
      if let Err(e) = sink.submit(job).await {
        e.log(&format!("output sink '{}'", sink.name()));
        failures.push(SinkFailure {
          sink: sink.name().to_owned(),
          reason: e.to_string(),
        });
      }
    }

    if failures.is_empty() {
      Ok(())
    } else {
      Err(NarratorError::Output(failures))
    }
  }
}

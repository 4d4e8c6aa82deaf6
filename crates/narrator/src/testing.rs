/*! Shared test helpers. */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::output::{Job, OutputSink};
use crate::types::{NarratorError, NarratorResult};

/// Poll `condition` until it holds, panicking after two seconds.
pub(crate) async fn wait_until<F, Fut>(what: &str, mut condition: F)
where
  F: FnMut() -> Fut,
  Fut: Future<Output = bool>,
{
  for _ in 0..200 {
    if condition().await {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("timed out waiting for {what}");
}

/// Records every job it receives.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
  jobs: Arc<Mutex<Vec<Job>>>,
}

impl RecordingSink {
  pub(crate) fn jobs(&self) -> Vec<Job> {
    self.jobs.lock().clone()
  }

  pub(crate) fn spoken(&self) -> Vec<String> {
    self.jobs.lock().iter().map(Job::spoken_text).collect()
  }

  pub(crate) fn last_spoken(&self) -> Option<String> {
    self.jobs.lock().last().map(Job::spoken_text)
  }
}

#[async_trait]
impl OutputSink for RecordingSink {
  fn name(&self) -> &'static str {
    "recording"
  }

  async fn submit(&self, job: &Job) -> NarratorResult<()> {
    self.jobs.lock().push(job.clone());
    Ok(())
  }
}

/// Fails every submission.
#[derive(Debug)]
pub(crate) struct FailingSink(pub(crate) &'static str);

#[async_trait]
impl OutputSink for FailingSink {
  fn name(&self) -> &'static str {
    self.0
  }

  async fn submit(&self, _job: &Job) -> NarratorResult<()> {
    Err(NarratorError::Sink {
      sink: self.0.to_owned(),
      reason: "unavailable".to_owned(),
    })
  }
}

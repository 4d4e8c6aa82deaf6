/*! Text output: narration written to the log. */

use async_trait::async_trait;

use super::{Job, OutputSink};
use crate::types::NarratorResult;

/// Logs every job at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLog;

#[async_trait]
impl OutputSink for TextLog {
  fn name(&self) -> &'static str {
    "text"
  }

  async fn submit(&self, job: &Job) -> NarratorResult<()> {
    log::info!(target: "narrator::output::text", "{job}");
    Ok(())
  }
}

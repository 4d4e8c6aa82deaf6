/*!
Single-slot, latest-wins job queue.

Controllers hold a [`JobSender`]; the owning application drains a
[`JobReceiver`] into its output. When jobs arrive faster than the output
consumes them, only the newest is kept.
*/

use std::sync::Arc;

use tokio::sync::watch;

use super::Job;

type Slot = Option<Arc<Job>>;

/// The queue. Hands out senders and receivers over the same slot.
#[derive(Debug, Clone)]
pub struct JobQueue {
  tx: JobSender,
}

impl Default for JobQueue {
  fn default() -> Self {
    Self::new()
  }
}

impl JobQueue {
  /// Empty queue.
  pub fn new() -> Self {
    let (tx, _) = watch::channel(None);
    Self {
      tx: JobSender { tx: Arc::new(tx) },
    }
  }

  /// A sender for one controller context.
  pub fn sender(&self) -> JobSender {
    self.tx.clone()
  }

  /// New receiver. Jobs stored before this call are not yielded.
  pub fn subscribe(&self) -> JobReceiver {
    JobReceiver {
      rx: self.tx.tx.subscribe(),
    }
  }
}

/// Non-owning link from a controller to its application's output.
#[derive(Debug, Clone)]
pub struct JobSender {
  tx: Arc<watch::Sender<Slot>>,
}

impl JobSender {
  /// Replace whatever job is waiting with `job`.
  pub fn send(&self, job: Job) {
    log::trace!("queue job: {job}");
    self.tx.send_replace(Some(Arc::new(job)));
  }
}

/// Drains the queue.
#[derive(Debug)]
pub struct JobReceiver {
  rx: watch::Receiver<Slot>,
}

impl JobReceiver {
  /// Next unseen job. `None` once every sender is gone and nothing is left.
  pub async fn recv(&mut self) -> Option<Arc<Job>> {
    loop {
      self.rx.changed().await.ok()?;
      if let Some(job) = self.rx.borrow_and_update().clone() {
        return Some(job);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn keeps_only_the_newest() {
    let queue = JobQueue::new();
    let mut rx = queue.subscribe();
    let tx = queue.sender();

    tx.send(Job::announcement("a", "first"));
    tx.send(Job::announcement("b", "second"));

    assert_eq!(rx.recv().await.unwrap().identifier, "b");
    let pending = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await;
    assert!(pending.is_err(), "a job is yielded at most once");
  }

  #[tokio::test]
  async fn earlier_jobs_are_not_replayed_to_new_receivers() {
    let queue = JobQueue::new();
    queue.sender().send(Job::announcement("old", "old"));

    let mut rx = queue.subscribe();
    queue.sender().send(Job::announcement("new", "new"));
    assert_eq!(rx.recv().await.unwrap().identifier, "new");
  }

  #[tokio::test]
  async fn ends_when_senders_are_gone() {
    let queue = JobQueue::new();
    let mut rx = queue.subscribe();
    queue.sender().send(Job::announcement("last", "last"));
    drop(queue);

    assert_eq!(rx.recv().await.unwrap().identifier, "last");
    assert!(rx.recv().await.is_none());
  }
}

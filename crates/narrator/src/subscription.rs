/*!
Cancelable notification subscriptions.

A [`Subscription`] owns the task that drains one [`NotificationStream`].
Cancelling aborts the task, which drops the stream and unsubscribes at the
platform. Cancel is synchronous, idempotent, and also happens on drop.
*/

use std::future::Future;

use tokio::task::JoinHandle;

use crate::a11y::Notification;
use crate::platform::{NotificationStream, Notified};

/// Handle to one running notification subscription.
pub(crate) struct Subscription {
  notification: Notification,
  task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("notification", &self.notification)
      .field("active", &self.is_active())
      .finish_non_exhaustive()
  }
}

impl Subscription {
  /// Drain `stream` on a new task, awaiting `handler` for each notification
  /// in emission order.
  pub(crate) fn spawn<E, F, Fut>(
    notification: Notification,
    mut stream: NotificationStream<E>,
    mut handler: F,
  ) -> Self
  where
    E: Send + 'static,
    F: FnMut(Notified<E>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
  {
    let task = tokio::spawn(async move {
      while let Some(notified) = stream.next().await {
        handler(notified).await;
      }
      log::trace!("{notification} stream ended");
    });
    Self {
      notification,
      task: Some(task),
    }
  }

  #[cfg(test)]
  pub(crate) const fn notification(&self) -> Notification {
    self.notification
  }

  pub(crate) fn is_active(&self) -> bool {
    self.task.as_ref().is_some_and(|t| !t.is_finished())
  }

  pub(crate) fn cancel(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::sync::mpsc;

  fn stream() -> (
    mpsc::UnboundedSender<Notified<u32>>,
    NotificationStream<u32>,
  ) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, NotificationStream::new(rx))
  }

  fn notified(element: u32) -> Notified<u32> {
    Notified {
      element,
      notification: Notification::ValueChanged,
    }
  }

  fn counting(seen: &Arc<AtomicUsize>) -> impl FnMut(Notified<u32>) -> std::future::Ready<()> {
    let seen = Arc::clone(seen);
    move |_| {
      seen.fetch_add(1, Ordering::SeqCst);
      std::future::ready(())
    }
  }

  #[tokio::test]
  async fn delivers_in_order() {
    let (tx, stream) = stream();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let _sub = Subscription::spawn(Notification::ValueChanged, stream, move |n: Notified<u32>| {
      let out_tx = out_tx.clone();
      async move {
        out_tx.send(n.element).ok();
      }
    });

    for i in 0..5 {
      tx.send(notified(i)).unwrap();
    }
    for i in 0..5 {
      assert_eq!(out_rx.recv().await, Some(i));
    }
  }

  #[tokio::test]
  async fn cancel_is_idempotent_and_closes_the_stream() {
    let seen = Arc::new(AtomicUsize::new(0));
    let (tx, stream) = stream();
    let mut sub = Subscription::spawn(Notification::ValueChanged, stream, counting(&seen));

    sub.cancel();
    sub.cancel();
    assert!(!sub.is_active());

    tx.closed().await;
    assert!(tx.send(notified(1)).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn drop_cancels() {
    let seen = Arc::new(AtomicUsize::new(0));
    let (tx, stream) = stream();
    let sub = Subscription::spawn(Notification::TitleChanged, stream, counting(&seen));
    assert_eq!(sub.notification(), Notification::TitleChanged);

    drop(sub);
    tx.closed().await;
  }
}

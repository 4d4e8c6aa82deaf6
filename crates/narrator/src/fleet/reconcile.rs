/*!
Applying running-application diffs to the set of live servers.
*/

use std::collections::{HashMap, HashSet};

use super::server::{Server, ServerProvider};
use crate::platform::Platform;
use crate::types::{ArrayChange, ProcessChange, RunningApplicationKey};

/// Live servers, at most one per key.
pub(crate) struct Fleet<P: Platform> {
  provider: ServerProvider<P>,
  running: HashMap<RunningApplicationKey, Server<P>>,
}

impl<P: Platform> std::fmt::Debug for Fleet<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Fleet")
      .field("running", &self.keys())
      .finish_non_exhaustive()
  }
}

impl<P: Platform> Fleet<P> {
  pub(crate) fn new(provider: ServerProvider<P>) -> Self {
    Self {
      provider,
      running: HashMap::new(),
    }
  }

  pub(crate) async fn apply(&mut self, change: ProcessChange) {
    log::debug!("process change: {change:?}");
    match change {
      ArrayChange::Insert(keys) => self.insert(keys).await,
      ArrayChange::Remove(keys) => self.remove(keys).await,
      ArrayChange::Replace(old, new) => {
        self.remove(old).await;
        self.insert(new).await;
      }
      ArrayChange::Set(keys) => self.set(keys).await,
    }
  }

  async fn insert(&mut self, keys: Vec<RunningApplicationKey>) {
    for key in keys {
      if self.running.contains_key(&key) {
        log::debug!("{key} already running");
        continue;
      }
      match self.provider.connect(&key) {
        Ok(server) => {
          server.start().await;
          self.running.insert(key, server);
        }
        Err(e) => e.log(&format!("connect {key}")),
      }
    }
  }

  async fn remove(&mut self, keys: Vec<RunningApplicationKey>) {
    for key in keys {
      if let Some(server) = self.running.remove(&key) {
        log::info!("disconnect {key}");
        server.stop().await;
      }
    }
  }

  /// Replace-all: drop what the snapshot lacks, add what it brings, keep
  /// servers present in both.
  async fn set(&mut self, keys: Vec<RunningApplicationKey>) {
    let wanted: HashSet<&RunningApplicationKey> = keys.iter().collect();
    let stale: Vec<RunningApplicationKey> = self
      .running
      .keys()
      .filter(|key| !wanted.contains(key))
      .cloned()
      .collect();
    self.remove(stale).await;
    self.insert(keys).await;
  }

  pub(crate) async fn stop_all(&mut self) {
    for (key, server) in self.running.drain() {
      log::info!("disconnect {key}");
      server.stop().await;
    }
  }

  pub(crate) fn keys(&self) -> Vec<RunningApplicationKey> {
    let mut keys: Vec<_> = self.running.keys().cloned().collect();
    keys.sort();
    keys
  }

  #[cfg(test)]
  pub(crate) fn server(&self, key: &RunningApplicationKey) -> Option<&Server<P>> {
    self.running.get(key)
  }
}

/*!
Per-process servers and the admission policy that opens them.
*/

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::Application;
use crate::config::Config;
use crate::output::OutputSink;
use crate::platform::Platform;
use crate::types::{BundleIdentifier, NarratorError, NarratorResult, ProcessId, RunningApplicationKey};

/// One admitted process: its key and its running [`Application`].
pub struct Server<P: Platform> {
  key: RunningApplicationKey,
  application: Application<P>,
}

impl<P: Platform> std::fmt::Debug for Server<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Server")
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> Server<P> {
  /// Open the application for `key`. Nothing starts yet.
  pub fn new(
    platform: Arc<P>,
    key: RunningApplicationKey,
    output: Arc<dyn OutputSink>,
  ) -> NarratorResult<Self> {
    let application = Application::new(platform, key.process_id, output)?;
    Ok(Self { key, application })
  }

  /// Process this server narrates.
  pub const fn key(&self) -> &RunningApplicationKey {
    &self.key
  }

  /// The running application.
  pub const fn application(&self) -> &Application<P> {
    &self.application
  }

  /// Start narrating this process.
  pub async fn start(&self) {
    self.application.start().await;
  }

  /// Stop narrating this process.
  pub async fn stop(&self) {
    self.application.stop().await;
  }
}

/// Decides which processes get a server, and opens them.
pub struct ServerProvider<P: Platform> {
  platform: Arc<P>,
  output: Arc<dyn OutputSink>,
  inclusion: HashSet<BundleIdentifier>,
  exclusion: HashSet<BundleIdentifier>,
  own_pid: ProcessId,
}

impl<P: Platform> std::fmt::Debug for ServerProvider<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ServerProvider")
      .field("inclusion", &self.inclusion)
      .field("exclusion", &self.exclusion)
      .field("own_pid", &self.own_pid)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> ServerProvider<P> {
  /// Admission lists come from `config`; `own_pid` is never admitted.
  pub fn new(
    platform: Arc<P>,
    output: Arc<dyn OutputSink>,
    config: &Config,
    own_pid: ProcessId,
  ) -> Self {
    Self {
      platform,
      output,
      inclusion: config.inclusion_list.iter().cloned().collect(),
      exclusion: config.exclusion_list.iter().cloned().collect(),
      own_pid,
    }
  }

  /// Exclusion list, then inclusion list (when non-empty), then never
  /// ourselves.
  pub fn admits(&self, key: &RunningApplicationKey) -> bool {
    if self.exclusion.contains(&key.bundle_identifier) {
      return false;
    }
    if !self.inclusion.is_empty() && !self.inclusion.contains(&key.bundle_identifier) {
      return false;
    }
    key.process_id != self.own_pid
  }

  /// Open a (not yet started) server for `key`.
  pub fn connect(&self, key: &RunningApplicationKey) -> NarratorResult<Server<P>> {
    if !self.admits(key) {
      return Err(NarratorError::Ignored(key.clone()));
    }
    log::info!("connect {key}");
    Server::new(Arc::clone(&self.platform), key.clone(), Arc::clone(&self.output))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::TextLog;
  use crate::platform::memory::MemoryPlatform;

  const OWN: ProcessId = ProcessId(1);

  fn provider(config: &Config) -> ServerProvider<MemoryPlatform> {
    ServerProvider::new(
      Arc::new(MemoryPlatform::new()),
      Arc::new(TextLog),
      config,
      OWN,
    )
  }

  fn key(pid: u32, bundle: &str) -> RunningApplicationKey {
    RunningApplicationKey::new(ProcessId(pid), bundle)
  }

  mod admission_tests {
    use super::*;

    #[test]
    fn default_config_excludes_webkit_helpers() {
      let provider = provider(&Config::default());
      assert!(!provider.admits(&key(10, "com.apple.WebKit.Networking")));
      assert!(provider.admits(&key(10, "com.apple.TextEdit")));
    }

    #[test]
    fn empty_lists_are_neutral() {
      let config = Config {
        exclusion_list: vec![],
        ..Config::default()
      };
      let provider = provider(&config);
      assert!(provider.admits(&key(10, "com.apple.webkit.networking")));
    }

    #[test]
    fn inclusion_list_restricts() {
      let config = Config {
        inclusion_list: vec![BundleIdentifier::new("com.apple.Safari")],
        ..Config::default()
      };
      let provider = provider(&config);
      assert!(provider.admits(&key(10, "COM.APPLE.SAFARI")));
      assert!(!provider.admits(&key(11, "com.apple.mail")));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
      let config = Config {
        inclusion_list: vec![BundleIdentifier::new("com.example.app")],
        exclusion_list: vec![BundleIdentifier::new("com.example.app")],
        ..Config::default()
      };
      assert!(!provider(&config).admits(&key(10, "com.example.app")));
    }

    #[test]
    fn rejected_keys_are_ignored() {
      let provider = provider(&Config::default());
      let own = key(OWN.0, "com.example.narrator");
      assert_eq!(
        provider.connect(&own).unwrap_err(),
        NarratorError::Ignored(own)
      );
    }

    #[test]
    fn admitted_keys_without_a_process_fail_to_connect() {
      let provider = provider(&Config::default());
      assert_eq!(
        provider.connect(&key(99, "com.example.gone")).unwrap_err(),
        NarratorError::ProcessNotFound(ProcessId(99))
      );
    }
  }

  mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
      #[test]
      fn own_pid_is_never_admitted(bundle in "[a-z]{1,8}\\.[a-z]{1,8}") {
        let provider = provider(&Config::default());
        prop_assert!(!provider.admits(&key(OWN.0, &bundle)));
      }

      #[test]
      fn excluded_bundles_are_never_admitted(
        bundle in "[a-zA-Z]{1,8}\\.[a-zA-Z]{1,8}",
        pid in 2u32..10_000,
        include in any::<bool>(),
      ) {
        let excluded = BundleIdentifier::new(&bundle);
        let config = Config {
          inclusion_list: if include { vec![excluded.clone()] } else { vec![] },
          exclusion_list: vec![excluded],
          ..Config::default()
        };
        prop_assert!(!provider(&config).admits(&key(pid, &bundle.to_uppercase())));
      }
    }
  }
}

/*!
Per-application controller registry and focus-chain tracking.

The hierarchy caches at most one [`Controller`] per element, watches each
cached element for destruction so its entry can be evicted, and recomputes
the focus chain whenever focus moves.

All state sits behind one async lock, held across controller construction,
so concurrent lookups of the same element build and watch it exactly once.
*/

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::a11y::Notification;
use crate::controller::{Controller, ControllerContext};
use crate::platform::{Platform, PlatformElement};
use crate::subscription::Subscription;
use crate::types::NarratorResult;

/// Bound on focus-chain length, in case a platform reports a parent cycle
/// we don't catch by identity.
const MAX_FOCUS_DEPTH: usize = 256;

struct Entry<P: Platform> {
  controller: Controller<P>,
  destroyed_watch: Option<Subscription>,
}

struct HierarchyState<P: Platform> {
  entries: HashMap<P::Element, Entry<P>>,
  focus_chain: Vec<Controller<P>>,
}

struct HierarchyInner<P: Platform> {
  context: ControllerContext<P>,
  state: Mutex<HierarchyState<P>>,
}

/// Controller registry for one application.
pub struct ControllerHierarchy<P: Platform> {
  inner: Arc<HierarchyInner<P>>,
}

impl<P: Platform> Clone for ControllerHierarchy<P> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<P: Platform> std::fmt::Debug for ControllerHierarchy<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ControllerHierarchy").finish_non_exhaustive()
  }
}

impl<P: Platform> ControllerHierarchy<P> {
  pub(crate) fn new(context: ControllerContext<P>) -> Self {
    Self {
      inner: Arc::new(HierarchyInner {
        context,
        state: Mutex::new(HierarchyState {
          entries: HashMap::new(),
          focus_chain: Vec::new(),
        }),
      }),
    }
  }

  /// Cached controller for `element`, built (and watched) on first use.
  pub async fn controller(&self, element: &P::Element) -> Controller<P> {
    let mut state = self.inner.state.lock().await;
    self.controller_locked(&mut state, element)
  }

  fn controller_locked(
    &self,
    state: &mut HierarchyState<P>,
    element: &P::Element,
  ) -> Controller<P> {
    if let Some(entry) = state.entries.get(element) {
      return entry.controller.clone();
    }

    let destroyed_watch = self.watch_destroyed(element);
    let controller = Controller::new(element.clone(), self.inner.context.clone());
    log::trace!("built {controller:?}");
    state.entries.insert(
      element.clone(),
      Entry {
        controller: controller.clone(),
        destroyed_watch,
      },
    );
    controller
  }

  fn watch_destroyed(&self, element: &P::Element) -> Option<Subscription> {
    let stream = match self
      .inner
      .context
      .platform
      .subscribe(element, Notification::Destroyed)
    {
      Ok(stream) => stream,
      Err(e) => {
        e.log(&format!("destroyed watch on {element:?}"));
        return None;
      }
    };

    let hierarchy: Weak<HierarchyInner<P>> = Arc::downgrade(&self.inner);
    let element = element.clone();
    Some(Subscription::spawn(
      Notification::Destroyed,
      stream,
      move |_| {
        let hierarchy = hierarchy.clone();
        let element = element.clone();
        async move {
          if let Some(inner) = hierarchy.upgrade() {
            Self { inner }.element_destroyed(&element).await;
          }
        }
      },
    ))
  }

  /// Evict `element`: stop its controller, drop it from the focus chain,
  /// then cancel its watch. Unknown elements are ignored.
  pub(crate) async fn element_destroyed(&self, element: &P::Element) {
    let mut state = self.inner.state.lock().await;
    let Some(mut entry) = state.entries.remove(element) else {
      return;
    };
    log::debug!("evicting {:?}", entry.controller);

    entry.controller.stop().await;
    state.focus_chain.retain(|c| !c.is(&entry.controller));

    // Last: this may be the task we're running on.
    if let Some(watch) = entry.destroyed_watch.as_mut() {
      watch.cancel();
    }
  }

  /// Build and start the controller for a window.
  pub async fn register_window(&self, window: &P::Element) -> NarratorResult<Controller<P>> {
    let controller = self.controller(window).await;
    controller.start().await?;
    Ok(controller)
  }

  /// Recompute the focus chain below `root`.
  ///
  /// The leaf is the root's focused element, or `element` when that can't
  /// be resolved. Every controller on the chain is started, controllers that
  /// left the chain are stopped, and the leaf is focused. Returns the chain
  /// ordered root-side first.
  pub async fn focus(&self, root: &P::Element, element: &P::Element) -> Vec<Controller<P>> {
    let leaf = match root.focused_ui_element() {
      Ok(focused) => focused,
      Err(e) => {
        e.log("focused element");
        element.clone()
      }
    };
    let path = focus_path(root, leaf);

    let mut state = self.inner.state.lock().await;
    let chain: Vec<Controller<P>> = path
      .iter()
      .rev()
      .map(|element| self.controller_locked(&mut state, element))
      .collect();

    // Until every stale controller is stopped, the remembered chain covers
    // both chains, so a focus dropped mid-way leaves nothing running untracked.
    let stale: Vec<Controller<P>> = state
      .focus_chain
      .iter()
      .filter(|old| !chain.iter().any(|c| c.is(old)))
      .cloned()
      .collect();
    let added: Vec<Controller<P>> = chain
      .iter()
      .filter(|c| !state.focus_chain.iter().any(|old| old.is(c)))
      .cloned()
      .collect();
    state.focus_chain.extend(added);

    for controller in &chain {
      if let Err(e) = controller.start().await {
        e.log(&format!("starting {controller:?}"));
      }
    }
    for old in &stale {
      old.stop().await;
    }

    if let Some(last) = chain.last() {
      last.focus();
    }
    state.focus_chain.clone_from(&chain);
    chain
  }

  /// The chain computed by the latest [`Self::focus`], minus evicted entries.
  /// After a focus dropped part-way it still holds the previous chain too.
  pub async fn focus_chain(&self) -> Vec<Controller<P>> {
    self.inner.state.lock().await.focus_chain.clone()
  }

  /// Number of cached controllers.
  pub async fn len(&self) -> usize {
    self.inner.state.lock().await.entries.len()
  }

  /// True when no controller is cached.
  pub async fn is_empty(&self) -> bool {
    self.len().await == 0
  }

  /// Whether `element` has a cached controller.
  pub async fn contains(&self, element: &P::Element) -> bool {
    self.inner.state.lock().await.entries.contains_key(element)
  }
}

/// Elements from `leaf` up to (excluding) `root`, leaf first.
fn focus_path<E: PlatformElement>(root: &E, leaf: E) -> Vec<E> {
  let mut path = Vec::new();
  let mut seen = HashSet::new();
  let mut current = leaf;

  loop {
    if current == *root || !seen.insert(current.clone()) {
      break;
    }
    if path.len() >= MAX_FOCUS_DEPTH {
      log::warn!("focus chain deeper than {MAX_FOCUS_DEPTH}, truncating");
      break;
    }
    path.push(current.clone());
    match current.parent() {
      Ok(Some(parent)) => current = parent,
      Ok(None) => break,
      Err(e) => {
        e.log(&format!("parent of {current:?}"));
        break;
      }
    }
  }
  path
}

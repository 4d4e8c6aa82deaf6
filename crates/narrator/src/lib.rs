/*!
Narrator - screen reader engine

Mirrors the accessibility state of every running application and narrates
focus changes through pluggable output sinks.

```ignore
use std::sync::Arc;
use narrator::{Config, ScreenReader};

let reader = ScreenReader::builder(Arc::new(platform))
    .config(Config::load("narrator.json")?)
    .sink(speech)
    .build();

// Exit if accessibility permission is missing
reader.confirm_trust()?;

// One server per admitted process, opened and closed as processes come and go
reader.start().await;

// Stops the reconcile loop and every server
reader.stop().await;
```

# Structure

- `platform` - the seam to the OS accessibility layer, plus an in-memory desktop
- `controller` - per-element controllers and the role to controller mapping
- `hierarchy` - per-application controller cache and focus chain
- `application` - one process: window/focus notifications and job forwarding
- `fleet` - admission policy and per-process servers
- `output` - narration jobs, the job queue and output sinks
*/

mod application;
mod config;
mod controller;
mod fleet;
mod hierarchy;
mod screen_reader;
mod subscription;
mod types;

pub mod a11y;
pub mod output;
pub mod platform;

#[cfg(test)]
mod testing;

pub use types::*;

pub use crate::application::Application;
pub use crate::config::Config;
pub use crate::controller::{Controller, ControllerKind, RunState};
pub use crate::fleet::{Server, ServerProvider};
pub use crate::hierarchy::ControllerHierarchy;
pub use crate::screen_reader::{ScreenReader, ScreenReaderBuilder};

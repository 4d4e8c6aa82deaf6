/*!
Platform seam.

[`Platform`] and [`PlatformElement`] are the only way core code talks to the
accessibility layer. [`memory::MemoryPlatform`] is an in-process desktop used
by tests and by embedders without an OS backend.
*/

pub mod memory;
mod traits;

pub use traits::{NotificationStream, Notified, Platform, PlatformElement, ProcessChanges};

/*! Core types for narrator. */

#![allow(missing_docs)]

mod change;
mod error;
mod ids;

pub use change::{ArrayChange, ProcessChange};
pub use error::{NarratorError, NarratorResult, Severity, SinkFailure};
pub use ids::{BundleIdentifier, ProcessId, RunningApplicationKey};

/*! Diffs of an observed collection (the running-process list). */

use super::RunningApplicationKey;

/// Type and value of a single change to an observed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayChange<T> {
  /// The whole list was set to a new value.
  Set(Vec<T>),
  /// Items were inserted.
  Insert(Vec<T>),
  /// Items were removed.
  Remove(Vec<T>),
  /// Items were replaced: (old, new).
  Replace(Vec<T>, Vec<T>),
}

/// A change to the set of running applications.
pub type ProcessChange = ArrayChange<RunningApplicationKey>;

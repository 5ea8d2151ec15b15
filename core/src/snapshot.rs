//! Single-value state containers.
//!
//! A [`Snapshot`] wraps exactly one application-state value as it was at the
//! moment the producer emitted it. The pipeline only ever reads it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One wrapped state value emitted by a producer.
///
/// # Examples
///
/// ```
/// use fabulous_core::Snapshot;
///
/// let todos = Snapshot::new(vec!["buy milk", "write docs"]);
/// let total = todos.as_ref().map(Vec::len);
/// assert_eq!(total.into_inner(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot<T>(T);

impl<T> Snapshot<T> {
    /// Wrap a state value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.0
    }

    /// Unwrap the value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Derive a new snapshot from this one.
    ///
    /// Used to project one producer onto several views, e.g. a todo list
    /// snapshot mapped to `{ complete, total }` counts.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Snapshot<U>
    where
        F: FnOnce(T) -> U,
    {
        Snapshot(f(self.0))
    }

    /// Borrowing view of this snapshot.
    #[must_use]
    pub const fn as_ref(&self) -> Snapshot<&T> {
        Snapshot(&self.0)
    }
}

impl<T> From<T> for Snapshot<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: fmt::Display> fmt::Display for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_projects_value() {
        let snapshot = Snapshot::new(vec![1, 2, 3]);
        let sum = snapshot.map(|v| v.iter().sum::<i32>());
        assert_eq!(sum.into_inner(), 6);
    }

    #[test]
    fn as_ref_leaves_original_intact() {
        let snapshot = Snapshot::new(String::from("todo"));
        let len = snapshot.as_ref().map(|s| s.len());
        assert_eq!(*len.get(), 4);
        assert_eq!(snapshot.get(), "todo");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn serializes_transparently() {
        let snapshot = Snapshot::new(vec!["a", "b"]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn map_composes(items in prop::collection::vec(any::<u8>(), 0..32)) {
                let len_then_double = Snapshot::new(items.clone())
                    .map(|v| v.len())
                    .map(|n| n * 2);
                let at_once = Snapshot::new(items).map(|v| v.len() * 2);
                prop_assert_eq!(len_then_double, at_once);
            }

            #[test]
            fn map_identity_keeps_value(text in ".{0,16}") {
                let snapshot = Snapshot::new(text.clone());
                prop_assert_eq!(snapshot.map(|s| s).into_inner(), text);
            }
        }
    }
}

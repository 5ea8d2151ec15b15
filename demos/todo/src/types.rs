//! Domain types for the Todo demo.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a todo item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// What needs doing
    pub description: String,
    /// Whether it is done
    pub complete: bool,
}

impl Todo {
    /// Creates an incomplete todo with a fresh id
    #[must_use]
    pub fn create(description: impl Into<String>) -> Self {
        Self {
            id: TodoId::new(),
            description: description.into(),
            complete: false,
        }
    }
}

/// The todo list as published to views
///
/// Shared so that fanning one snapshot out to several views does not copy
/// the list.
pub type Todos = Arc<Vec<Todo>>;

/// Actions the controller can send to the model
///
/// Positions are 1-based, matching the order the list is displayed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Append a new todo
    Add {
        /// Text of the new todo
        description: String,
    },

    /// Delete the todo at `position`
    Remove {
        /// 1-based position in the list
        position: usize,
    },

    /// Flip the complete flag of the todo at `position`
    Toggle {
        /// 1-based position in the list
        position: usize,
    },

    /// Set every todo's complete flag
    CompleteAll {
        /// New value for every todo
        complete: bool,
    },

    /// Delete every completed todo
    ClearCompleted,
}

/// Counts derived from a todo list snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Completed todos
    pub complete: usize,
    /// All todos
    pub total: usize,
}

impl Stats {
    /// Count the complete todos in `todos`
    #[must_use]
    pub fn of(todos: &[Todo]) -> Self {
        Self {
            complete: todos.iter().filter(|todo| todo.complete).count(),
            total: todos.len(),
        }
    }

    /// Todos still to do
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.total - self.complete
    }

    /// Whether the "toggle all" box should be checked
    #[must_use]
    pub const fn all_complete(&self) -> bool {
        self.total > 0 && self.total == self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_complete_and_remaining() {
        let mut todos = vec![Todo::create("a"), Todo::create("b"), Todo::create("c")];
        todos[1].complete = true;

        let stats = Stats::of(&todos);

        assert_eq!(stats, Stats { complete: 1, total: 3 });
        assert_eq!(stats.remaining(), 2);
        assert!(!stats.all_complete());
    }

    #[test]
    fn empty_list_is_never_all_complete() {
        assert!(!Stats::of(&[]).all_complete());
    }

    #[test]
    fn todos_serialize_with_plain_ids() {
        let todo = Todo {
            id: TodoId::from_uuid(Uuid::nil()),
            description: "buy milk".to_string(),
            complete: false,
        };

        let json = serde_json::to_string(&todo).unwrap_or_default();

        assert_eq!(
            json,
            r#"{"id":"00000000-0000-0000-0000-000000000000","description":"buy milk","complete":false}"#
        );
    }
}

//! Reducer logic for the todo list.
//!
//! Validate the action against the current list, then apply it. Invalid
//! actions leave the list untouched.

use crate::types::{Todo, TodoAction};
use thiserror::Error;

/// Maximum length of a todo description, in bytes
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Reasons an action was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// The description is empty or only whitespace
    #[error("todo description cannot be empty")]
    EmptyDescription,

    /// The description is longer than [`MAX_DESCRIPTION_LEN`]
    #[error("todo description too long (max {MAX_DESCRIPTION_LEN} bytes)")]
    DescriptionTooLong,

    /// No todo at that position
    #[error("no todo at position {position} (list has {len})")]
    NoSuchPosition {
        /// Requested 1-based position
        position: usize,
        /// Current list length
        len: usize,
    },
}

/// Reducer for the todo list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply `action` to `todos`.
    ///
    /// Returns whether the list changed.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError`] if the action is invalid for the current list.
    pub fn reduce(&self, todos: &mut Vec<Todo>, action: TodoAction) -> Result<bool, TodoError> {
        match action {
            TodoAction::Add { description } => {
                let description = Self::validate_description(&description)?;
                todos.push(Todo::create(description));
                Ok(true)
            }
            TodoAction::Remove { position } => {
                let index = Self::validate_position(todos, position)?;
                todos.remove(index);
                Ok(true)
            }
            TodoAction::Toggle { position } => {
                let index = Self::validate_position(todos, position)?;
                todos[index].complete = !todos[index].complete;
                Ok(true)
            }
            TodoAction::CompleteAll { complete } => {
                let mut changed = false;
                for todo in todos.iter_mut().filter(|todo| todo.complete != complete) {
                    todo.complete = complete;
                    changed = true;
                }
                Ok(changed)
            }
            TodoAction::ClearCompleted => {
                let before = todos.len();
                todos.retain(|todo| !todo.complete);
                Ok(todos.len() != before)
            }
        }
    }

    fn validate_description(description: &str) -> Result<&str, TodoError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TodoError::EmptyDescription);
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(TodoError::DescriptionTooLong);
        }
        Ok(description)
    }

    fn validate_position(todos: &[Todo], position: usize) -> Result<usize, TodoError> {
        if position == 0 || position > todos.len() {
            return Err(TodoError::NoSuchPosition {
                position,
                len: todos.len(),
            });
        }
        Ok(position - 1)
    }
}

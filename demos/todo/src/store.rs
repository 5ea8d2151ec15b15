//! Persistence for the todo list.
//!
//! A store holds at most one saved list. [`initial_todos`] seeds a generated
//! list when nothing has been saved yet.

use crate::types::Todo;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors from loading or saving todos
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read or written
    #[error("todo store I/O failed for {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The backing file does not hold a todo list
    #[error("todo store at {} is corrupt: {source}", .path.display())]
    Corrupt {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save of a serialized todo list
pub trait TodoStore: Send + Sync {
    /// Load the saved list, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the saved list cannot be read.
    fn load(&self) -> Result<Option<Vec<Todo>>, StoreError>;

    /// Replace the saved list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the list cannot be written.
    fn save(&self, todos: &[Todo]) -> Result<(), StoreError>;
}

/// In-memory store, empty until the first save
#[derive(Debug, Default)]
pub struct MemoryStore {
    todos: Mutex<Option<Vec<Todo>>>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `todos`
    #[must_use]
    pub const fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: Mutex::new(Some(todos)),
        }
    }
}

impl TodoStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Todo>>, StoreError> {
        Ok(self
            .todos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, todos: &[Todo]) -> Result<(), StoreError> {
        *self.todos.lock().unwrap_or_else(PoisonError::into_inner) = Some(todos.to_vec());
        Ok(())
    }
}

/// Store keeping the list as JSON in one file
///
/// A missing file means nothing was saved yet.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TodoStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Todo>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(error)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, todos: &[Todo]) -> Result<(), StoreError> {
        let json = serde_json::to_vec(todos).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // Replace atomically
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, json).map_err(|error| self.io_error(error))?;
        fs::rename(&staging, &self.path).map_err(|error| self.io_error(error))
    }
}

/// The saved list, or `seed` generated todos if nothing was saved.
#[must_use]
pub fn initial_todos(saved: Option<Vec<Todo>>, seed: usize) -> Vec<Todo> {
    saved.unwrap_or_else(|| (0..seed).map(|i| Todo::create(format!("Todo {i}"))).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let todos = vec![Todo::create("a")];
        store.save(&todos).unwrap();

        assert_eq!(store.load().unwrap(), Some(todos));
    }

    #[test]
    fn missing_file_loads_as_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::at(dir.path().join("todos.json"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        let mut todos = vec![Todo::create("a"), Todo::create("b")];
        todos[1].complete = true;

        JsonFileStore::at(&path).save(&todos).unwrap();

        assert_eq!(JsonFileStore::at(&path).load().unwrap(), Some(todos));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        fs::write(&path, "not json").unwrap();

        let error = JsonFileStore::at(&path).load().unwrap_err();

        assert!(matches!(error, StoreError::Corrupt { .. }));
    }

    #[test]
    fn seeds_only_when_nothing_saved() {
        let seeded = initial_todos(None, 3);
        assert_eq!(seeded.len(), 3);
        assert_eq!(seeded[2].description, "Todo 2");

        let saved = initial_todos(Some(vec![Todo::create("mine")]), 3);
        assert_eq!(saved.len(), 1);
    }
}

//! # Todo demo
//!
//! A TodoMVC-style application built on the Fabulous view pipeline.
//!
//! Commands are read one per line, folded into a todo list by a reducer and
//! rendered by three views that share one frame scheduler: the list itself,
//! the "toggle all" checkbox and the footer with its counters.
//!
//! ## Modules
//!
//! - [`types`]: Todos, actions and derived counts
//! - [`reducer`]: Applies actions to the list
//! - [`store`]: Loads and saves the list
//! - [`controller`]: Parses commands into actions
//! - [`model`]: Actions in, list snapshots out
//! - [`views`]: Render functions
//! - [`app`]: Wires everything onto one document

pub mod app;
pub mod controller;
pub mod model;
pub mod reducer;
pub mod store;
pub mod types;
pub mod views;

pub use app::{App, RunReport};
pub use controller::{CommandError, actions, parse_command};
pub use reducer::{TodoError, TodoReducer};
pub use store::{JsonFileStore, MemoryStore, StoreError, TodoStore, initial_todos};
pub use types::{Stats, Todo, TodoAction, TodoId, Todos};

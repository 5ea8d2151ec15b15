//! # Fabulous Vdom
//!
//! An in-memory virtual tree backend for the Fabulous pipeline.
//!
//! This crate provides:
//! - [`VNode`] trees and the [`h`] selector builder
//! - [`diff`], an index-based reconciler producing a [`PatchSet`]
//! - [`Document`], a shared arena of live nodes addressed by [`NodeRef`]
//! - [`VdomBackend`], the [`fabulous_core::Backend`] tying them together
//!
//! ## Patch protocol
//!
//! - Operations address nodes by child-index path from the patched root.
//! - Operations are applied in order.
//! - A patch set is validated against the document as a whole before any
//!   operation is applied; a rejected patch leaves the document untouched.
//! - Replacing the root (empty path) yields a new surface handle.
//!
//! ## Example
//!
//! ```
//! use fabulous_core::Backend;
//! use fabulous_vdom::{h, Document, VNode, VdomBackend};
//!
//! let document = Document::new();
//! let body = document.create(&h("body").child(h("ul#todo-list")).into_node());
//! let placeholder = document.element_by_id("todo-list").unwrap();
//!
//! let backend = VdomBackend;
//! let empty: VNode = h("ul#todo-list").into();
//! let list = backend.mount(&placeholder, &empty).unwrap();
//!
//! let one: VNode = h("ul#todo-list").child(h("li").text("a")).into();
//! let patch = backend.diff(&empty, &one);
//! let list = backend.apply(&list, patch).unwrap();
//!
//! assert_eq!(list.to_html(), r#"<ul id="todo-list"><li>a</li></ul>"#);
//! assert_eq!(body.to_html(), r#"<body><ul id="todo-list"><li>a</li></ul></body>"#);
//! ```

mod backend;
mod diff;
mod document;
mod error;
mod html;
mod node;

pub use backend::VdomBackend;
pub use diff::{Path, PatchOp, PatchSet, diff};
pub use document::{Document, NodeId, NodeRef};
pub use error::VdomError;
pub use node::{VElement, VNode, h};

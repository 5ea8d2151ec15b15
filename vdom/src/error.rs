//! Errors raised while mounting or patching a document.

use crate::document::NodeId;
use thiserror::Error;

/// A mount or patch did not fit the live document.
///
/// Whenever one of these is returned, the document was not modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VdomError {
    /// The handle points to a node that has since been removed
    #[error("node {0:?} is no longer part of the document")]
    Stale(NodeId),

    /// The node has no parent, so it cannot be replaced
    #[error("node {0:?} is not attached to a parent")]
    Detached(NodeId),

    /// A patch path does not lead to a node
    #[error("no node at path {path:?}")]
    PathNotFound {
        /// Prefix of the path that failed to resolve
        path: Vec<usize>,
    },

    /// A patch operation targets the wrong kind of node
    #[error("node at path {path:?} is a {found} node, expected {expected}")]
    KindMismatch {
        /// Path of the offending node
        path: Vec<usize>,
        /// Kind the operation needs
        expected: &'static str,
        /// Kind actually found
        found: &'static str,
    },

    /// A truncate would keep more children than exist
    #[error("node at path {path:?} has {actual} children, expected at least {expected}")]
    TooFewChildren {
        /// Path of the parent
        path: Vec<usize>,
        /// Children the patch expects to keep
        expected: usize,
        /// Children present
        actual: usize,
    },
}

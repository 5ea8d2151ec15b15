//! Index-based reconciliation of virtual trees.

use crate::node::{VElement, VNode};
use smallvec::SmallVec;

/// Child-index path from the patched root to a node. Empty means the root.
pub type Path = SmallVec<[usize; 8]>;

/// One mutation of a live tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchOp {
    /// Replace the node at `path` (and its subtree) with a freshly built one
    Replace {
        /// Node to replace
        path: Path,
        /// Replacement tree
        node: VNode,
    },
    /// Replace the contents of a text node
    SetText {
        /// Text node to update
        path: Path,
        /// New contents
        text: String,
    },
    /// Update attributes of an element
    SetAttrs {
        /// Element to update
        path: Path,
        /// Attributes to add or overwrite
        set: Vec<(String, String)>,
        /// Attributes to remove
        remove: Vec<String>,
    },
    /// Append children to an element
    Append {
        /// Parent element
        path: Path,
        /// New trailing children
        nodes: Vec<VNode>,
    },
    /// Remove trailing children so that `len` remain
    Truncate {
        /// Parent element
        path: Path,
        /// Number of children to keep
        len: usize,
    },
}

impl PatchOp {
    /// Path of the node this operation targets.
    #[must_use]
    pub fn path(&self) -> &[usize] {
        match self {
            Self::Replace { path, .. }
            | Self::SetText { path, .. }
            | Self::SetAttrs { path, .. }
            | Self::Append { path, .. }
            | Self::Truncate { path, .. } => path,
        }
    }
}

/// The minimal set of mutations turning one tree's output into another's.
///
/// Only [`diff`] produces non-empty patch sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchSet {
    ops: Vec<PatchOp>,
}

impl PatchSet {
    /// Check if applying this patch would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// The operations in application order
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Whether the patch replaces the root itself.
    #[must_use]
    pub fn replaces_root(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, PatchOp::Replace { path, .. } if path.is_empty()))
    }

    pub(crate) fn into_ops(self) -> Vec<PatchOp> {
        self.ops
    }
}

/// Compute the patch turning `old` into `new`.
///
/// Children are matched by position. Same-tag elements are updated in place;
/// anything else is replaced wholesale.
///
/// # Examples
///
/// ```
/// use fabulous_vdom::{diff, h, PatchOp};
///
/// let old = h("ul").child(h("li").text("a")).into_node();
/// let new = h("ul").child(h("li").text("a")).child(h("li").text("b")).into_node();
///
/// let patch = diff(&old, &new);
/// assert_eq!(patch.len(), 1);
/// assert!(matches!(&patch.ops()[0], PatchOp::Append { nodes, .. } if nodes.len() == 1));
/// assert!(diff(&new, &new).is_empty());
/// ```
#[must_use]
pub fn diff(old: &VNode, new: &VNode) -> PatchSet {
    let mut ops = Vec::new();
    let mut path = Path::new();
    diff_node(old, new, &mut path, &mut ops);
    PatchSet { ops }
}

fn diff_node(old: &VNode, new: &VNode, path: &mut Path, ops: &mut Vec<PatchOp>) {
    match (old, new) {
        (VNode::Text(before), VNode::Text(after)) => {
            if before != after {
                ops.push(PatchOp::SetText {
                    path: path.clone(),
                    text: after.clone(),
                });
            }
        }
        (VNode::Element(before), VNode::Element(after)) if before.tag == after.tag => {
            diff_attrs(before, after, path, ops);
            diff_children(before, after, path, ops);
        }
        _ => ops.push(PatchOp::Replace {
            path: path.clone(),
            node: new.clone(),
        }),
    }
}

fn diff_attrs(before: &VElement, after: &VElement, path: &Path, ops: &mut Vec<PatchOp>) {
    let set: Vec<(String, String)> = after
        .attrs
        .iter()
        .filter(|(name, value)| before.attrs.get(*name) != Some(*value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let remove: Vec<String> = before
        .attrs
        .keys()
        .filter(|name| !after.attrs.contains_key(*name))
        .cloned()
        .collect();

    if !set.is_empty() || !remove.is_empty() {
        ops.push(PatchOp::SetAttrs {
            path: path.clone(),
            set,
            remove,
        });
    }
}

fn diff_children(before: &VElement, after: &VElement, path: &mut Path, ops: &mut Vec<PatchOp>) {
    let common = before.children.len().min(after.children.len());
    for (index, (old, new)) in before.children.iter().zip(&after.children).enumerate() {
        path.push(index);
        diff_node(old, new, path, ops);
        path.pop();
    }

    if after.children.len() > common {
        ops.push(PatchOp::Append {
            path: path.clone(),
            nodes: after.children[common..].to_vec(),
        });
    } else if before.children.len() > common {
        ops.push(PatchOp::Truncate {
            path: path.clone(),
            len: common,
        });
    }
}

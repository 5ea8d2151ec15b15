//! [`Backend`] implementation over [`Document`](crate::Document).

use crate::diff::{PatchSet, diff};
use crate::document::NodeRef;
use crate::error::VdomError;
use crate::node::VNode;
use fabulous_core::Backend;

/// Differ/patcher for [`VNode`] trees rendered into a
/// [`Document`](crate::Document).
#[derive(Clone, Copy, Debug, Default)]
pub struct VdomBackend;

impl Backend for VdomBackend {
    type Tree = VNode;
    type Patch = PatchSet;
    type Surface = NodeRef;
    type Error = VdomError;

    fn mount(&self, placeholder: &NodeRef, tree: &VNode) -> Result<NodeRef, VdomError> {
        let mounted = placeholder.replace_with_tree(tree)?;
        tracing::debug!(
            placeholder = ?placeholder.id(),
            node = ?mounted.id(),
            size = tree.size(),
            "Mounted tree"
        );
        Ok(mounted)
    }

    fn diff(&self, old: &VNode, new: &VNode) -> PatchSet {
        diff(old, new)
    }

    #[tracing::instrument(skip_all, name = "vdom_apply", fields(ops = patch.len()))]
    fn apply(&self, surface: &NodeRef, patch: PatchSet) -> Result<NodeRef, VdomError> {
        if patch.is_empty() {
            tracing::trace!(node = ?surface.id(), "Empty patch, nothing to apply");
            return Ok(surface.clone());
        }

        let ops = patch.len();
        match surface.apply(patch) {
            Ok(patched) => {
                tracing::debug!(node = ?patched.id(), ops, "Applied patch");
                Ok(patched)
            }
            Err(error) => {
                tracing::warn!(node = ?surface.id(), ops, error = %error, "Rejected patch");
                Err(error)
            }
        }
    }
}

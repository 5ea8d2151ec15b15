//! A shared arena of live nodes.
//!
//! A [`Document`] plays the role of the live output: views mount into it and
//! patches mutate it. Nodes are addressed by generational keys, so a handle to
//! a removed node can never alias a node created later.

use crate::diff::{PatchOp, PatchSet};
use crate::error::VdomError;
use crate::html;
use crate::node::{VElement, VNode};
use slotmap::SlotMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

slotmap::new_key_type! {
    /// Key of a node inside a [`Document`].
    pub struct NodeId;
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

impl NodeKind {
    const fn name(&self) -> &'static str {
        match self {
            Self::Element { .. } => "element",
            Self::Text(_) => "text",
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: SlotMap<NodeId, Node>,
}

impl Arena {
    fn node(&self, id: NodeId) -> Result<&Node, VdomError> {
        self.nodes.get(id).ok_or(VdomError::Stale(id))
    }

    fn build(&mut self, tree: &VNode, parent: Option<NodeId>) -> NodeId {
        match tree {
            VNode::Text(text) => self.nodes.insert(Node {
                kind: NodeKind::Text(text.clone()),
                parent,
                children: Vec::new(),
            }),
            VNode::Element(element) => {
                let id = self.nodes.insert(Node {
                    kind: NodeKind::Element {
                        tag: element.tag.clone(),
                        attrs: element.attrs.clone(),
                    },
                    parent,
                    children: Vec::with_capacity(element.children.len()),
                });
                for child in &element.children {
                    let child_id = self.build(child, Some(id));
                    if let Some(node) = self.nodes.get_mut(id) {
                        node.children.push(child_id);
                    }
                }
                id
            }
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                pending.extend(node.children);
            }
        }
    }

    fn resolve(&self, root: NodeId, path: &[usize]) -> Result<NodeId, VdomError> {
        let mut current = root;
        for (depth, index) in path.iter().enumerate() {
            current = *self
                .node(current)?
                .children
                .get(*index)
                .ok_or_else(|| VdomError::PathNotFound {
                    path: path[..=depth].to_vec(),
                })?;
        }
        Ok(current)
    }

    /// Swap `new` in for `old` under `old`'s parent and drop `old`'s subtree.
    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), VdomError> {
        let parent = self.node(old)?.parent.ok_or(VdomError::Detached(old))?;
        let siblings = &mut self
            .nodes
            .get_mut(parent)
            .ok_or(VdomError::Stale(parent))?
            .children;
        let slot = siblings
            .iter()
            .position(|child| *child == old)
            .ok_or(VdomError::Detached(old))?;
        siblings[slot] = new;

        if let Some(node) = self.nodes.get_mut(new) {
            node.parent = Some(parent);
        }
        self.remove_subtree(old);
        Ok(())
    }

    fn expect_kind(
        &self,
        id: NodeId,
        path: &[usize],
        expected: &'static str,
    ) -> Result<&Node, VdomError> {
        let node = self.node(id)?;
        let found = node.kind.name();
        if found == expected {
            Ok(node)
        } else {
            Err(VdomError::KindMismatch {
                path: path.to_vec(),
                expected,
                found,
            })
        }
    }

    /// Check every operation against the current tree.
    ///
    /// Operations produced by `diff` never change the structure another
    /// operation of the same patch relies on, so checking them all up front
    /// against the unpatched tree is enough to guarantee the apply succeeds.
    fn validate(&self, root: NodeId, ops: &[PatchOp]) -> Result<(), VdomError> {
        self.node(root)?;
        for op in ops {
            let path = op.path();
            let target = self.resolve(root, path)?;
            match op {
                PatchOp::Replace { .. } => {
                    if path.is_empty() && self.node(root)?.parent.is_none() {
                        return Err(VdomError::Detached(root));
                    }
                }
                PatchOp::SetText { .. } => {
                    self.expect_kind(target, path, "text")?;
                }
                PatchOp::SetAttrs { .. } | PatchOp::Append { .. } => {
                    self.expect_kind(target, path, "element")?;
                }
                PatchOp::Truncate { len, .. } => {
                    let node = self.expect_kind(target, path, "element")?;
                    if node.children.len() < *len {
                        return Err(VdomError::TooFewChildren {
                            path: path.to_vec(),
                            expected: *len,
                            actual: node.children.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, root: NodeId, ops: Vec<PatchOp>) -> Result<NodeId, VdomError> {
        self.validate(root, &ops)?;

        let mut root = root;
        for op in ops {
            let target = self.resolve(root, op.path())?;
            match op {
                PatchOp::Replace { path, node } => {
                    let replacement = self.build(&node, None);
                    self.replace(target, replacement)?;
                    if path.is_empty() {
                        root = replacement;
                    }
                }
                PatchOp::SetText { text, .. } => {
                    if let Some(Node {
                        kind: NodeKind::Text(contents),
                        ..
                    }) = self.nodes.get_mut(target)
                    {
                        *contents = text;
                    }
                }
                PatchOp::SetAttrs { set, remove, .. } => {
                    if let Some(Node {
                        kind: NodeKind::Element { attrs, .. },
                        ..
                    }) = self.nodes.get_mut(target)
                    {
                        for name in remove {
                            attrs.remove(&name);
                        }
                        attrs.extend(set);
                    }
                }
                PatchOp::Append { nodes, .. } => {
                    let built: Vec<NodeId> = nodes
                        .iter()
                        .map(|node| self.build(node, Some(target)))
                        .collect();
                    if let Some(parent) = self.nodes.get_mut(target) {
                        parent.children.extend(built);
                    }
                }
                PatchOp::Truncate { len, .. } => {
                    let removed = self
                        .nodes
                        .get_mut(target)
                        .map(|parent| parent.children.split_off(len))
                        .unwrap_or_default();
                    for child in removed {
                        self.remove_subtree(child);
                    }
                }
            }
        }
        Ok(root)
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => html::text(out, text),
            NodeKind::Element { tag, attrs } => {
                html::open_tag(out, tag, attrs);
                for child in &node.children {
                    self.write_html(*child, out);
                }
                html::close_tag(out, tag);
            }
        }
    }

    fn to_vnode(&self, id: NodeId) -> Result<VNode, VdomError> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Text(text) => Ok(VNode::Text(text.clone())),
            NodeKind::Element { tag, attrs } => {
                let children = node
                    .children
                    .iter()
                    .map(|child| self.to_vnode(*child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(VNode::Element(VElement {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                    children,
                }))
            }
        }
    }
}

/// The live output tree.
///
/// Cloning a `Document` gives another handle to the same nodes.
#[derive(Clone, Debug, Default)]
pub struct Document {
    arena: Arc<Mutex<Arena>>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, id: NodeId) -> NodeRef {
        NodeRef {
            document: self.clone(),
            id,
        }
    }

    /// Build a detached subtree for `tree` and return its root.
    #[must_use]
    pub fn create(&self, tree: &VNode) -> NodeRef {
        let id = self.lock().build(tree, None);
        self.handle(id)
    }

    /// Find an element by its `id` attribute.
    #[must_use]
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeRef> {
        let found = self.lock().nodes.iter().find_map(|(id, node)| match &node.kind {
            NodeKind::Element { attrs, .. }
                if attrs.get("id").map(String::as_str) == Some(element_id) =>
            {
                Some(id)
            }
            _ => None,
        });
        found.map(|id| self.handle(id))
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Check if the document has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a live node: the surface type of [`crate::VdomBackend`].
#[derive(Clone)]
pub struct NodeRef {
    document: Document,
    id: NodeId,
}

impl NodeRef {
    /// The document this node belongs to.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The node's key.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Check if the node is still part of the document
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.document.lock().nodes.contains_key(self.id)
    }

    /// The parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let parent = self.document.lock().nodes.get(self.id)?.parent?;
        Some(self.document.handle(parent))
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let ids = self
            .document
            .lock()
            .nodes
            .get(self.id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        ids.into_iter().map(|id| self.document.handle(id)).collect()
    }

    /// Element name, or `None` for text nodes and stale handles.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        match &self.document.lock().nodes.get(self.id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Attribute value, if set.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.document.lock().nodes.get(self.id)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        fn collect(arena: &Arena, id: NodeId, out: &mut String) {
            if let Some(node) = arena.nodes.get(id) {
                if let NodeKind::Text(text) = &node.kind {
                    out.push_str(text);
                }
                for child in &node.children {
                    collect(arena, *child, out);
                }
            }
        }

        let mut out = String::new();
        collect(&self.document.lock(), self.id, &mut out);
        out
    }

    /// Serialize this subtree to HTML. Stale handles serialize to `""`.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.document.lock().write_html(self.id, &mut out);
        out
    }

    /// Rebuild the virtual tree this subtree currently reflects.
    ///
    /// # Errors
    ///
    /// Returns [`VdomError::Stale`] if the node was removed.
    pub fn to_vnode(&self) -> Result<VNode, VdomError> {
        self.document.lock().to_vnode(self.id)
    }

    /// Build `tree` and put it where this node is, removing this node.
    ///
    /// # Errors
    ///
    /// Returns [`VdomError::Stale`] if this node was removed, or
    /// [`VdomError::Detached`] if it has no parent. The document is not
    /// modified in either case.
    pub fn replace_with_tree(&self, tree: &VNode) -> Result<Self, VdomError> {
        let mut arena = self.document.lock();
        if arena.node(self.id)?.parent.is_none() {
            return Err(VdomError::Detached(self.id));
        }
        let replacement = arena.build(tree, None);
        arena.replace(self.id, replacement)?;
        drop(arena);
        Ok(self.document.handle(replacement))
    }

    /// Apply a patch rooted at this node.
    ///
    /// Returns the handle for the patched subtree, which is a new node if the
    /// patch replaced the root.
    ///
    /// # Errors
    ///
    /// Returns an error if any operation of the patch does not fit the
    /// current tree. Nothing is applied in that case.
    pub fn apply(&self, patch: PatchSet) -> Result<Self, VdomError> {
        let root = self.document.lock().apply(self.id, patch.into_ops())?;
        Ok(self.document.handle(root))
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.document.arena, &other.document.arena)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.id).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::node::h;

    fn page(document: &Document) -> NodeRef {
        document.create(
            &h("section#todoapp")
                .child(h("ul#todo-list"))
                .child(h("footer#footer"))
                .into_node(),
        )
    }

    #[test]
    fn element_by_id_finds_nested_nodes() {
        let document = Document::new();
        let app = page(&document);

        let list = document.element_by_id("todo-list").unwrap();
        assert_eq!(list.tag().as_deref(), Some("ul"));
        assert_eq!(list.parent(), Some(app));
        assert!(document.element_by_id("missing").is_none());
    }

    #[test]
    fn replace_with_tree_removes_old_node() {
        let document = Document::new();
        let app = page(&document);
        let placeholder = document.element_by_id("todo-list").unwrap();

        let mounted = placeholder
            .replace_with_tree(&h("ul#todo-list").child(h("li").text("a")).into_node())
            .unwrap();

        assert!(!placeholder.is_live());
        assert!(mounted.is_live());
        assert_eq!(app.children()[0], mounted);
        assert_eq!(mounted.text_content(), "a");
    }

    #[test]
    fn replacing_detached_node_fails_without_side_effects() {
        let document = Document::new();
        let orphan = document.create(&h("div").into_node());
        let before = document.len();

        let result = orphan.replace_with_tree(&h("span").into_node());
        assert_eq!(result.unwrap_err(), VdomError::Detached(orphan.id()));
        assert_eq!(document.len(), before);
    }

    #[test]
    fn apply_updates_text_attrs_and_children() {
        let document = Document::new();
        let old = h("ul")
            .child(h("li.completed").text("a"))
            .child(h("li").text("b"))
            .child(h("li").text("c"))
            .into_node();
        let new = h("ul")
            .child(h("li").text("a"))
            .child(h("li").text("z"))
            .into_node();
        let root = document.create(&old);

        let patched = root.apply(diff(&old, &new)).unwrap();

        assert_eq!(patched, root);
        assert_eq!(patched.to_vnode().unwrap(), new);
        assert_eq!(document.len(), new.size());
    }

    #[test]
    fn root_replacement_returns_new_handle() {
        let document = Document::new();
        let app = page(&document);
        let footer = document.element_by_id("footer").unwrap();
        let old = h("footer#footer").into_node();
        let new = h("div#footer").into_node();

        let patched = footer.apply(diff(&old, &new)).unwrap();

        assert_ne!(patched, footer);
        assert!(!footer.is_live());
        assert_eq!(patched.tag().as_deref(), Some("div"));
        assert_eq!(app.children()[1], patched);
    }

    #[test]
    fn mismatched_patch_is_rejected_atomically() {
        let document = Document::new();
        let old = h("ul").child(h("li").text("a")).into_node();
        let new = h("ul.done").child(h("li").text("b")).into_node();
        // The live tree lost its child, so the SetText op cannot resolve
        let root = document.create(&h("ul").into_node());

        let err = root.apply(diff(&old, &new)).unwrap_err();

        assert!(matches!(err, VdomError::PathNotFound { .. }));
        // The class change that came first in the patch was not applied
        assert_eq!(root.attr("class"), None);
    }

    #[test]
    fn stale_handle_is_reported() {
        let document = Document::new();
        let app = page(&document);
        let list = document.element_by_id("todo-list").unwrap();
        let _ = list.replace_with_tree(&h("ol").into_node()).unwrap();

        let tree = h("ul").into_node();
        let patch = diff(&tree, &h("ul.x").into_node());
        assert_eq!(list.apply(patch).unwrap_err(), VdomError::Stale(list.id()));
        assert!(app.is_live());
    }

    #[test]
    fn html_serialization_matches_virtual_tree() {
        let document = Document::new();
        let tree = h("footer#footer")
            .child(h("span#todo-count").child(h("strong").text("2")).text(" items left"))
            .into_node();
        let node = document.create(&tree);
        assert_eq!(node.to_html(), tree.to_html());
    }
}

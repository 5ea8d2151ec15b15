//! A document with a mount point, wired to a hand-fired scheduler.

use fabulous_core::Backend;
use fabulous_runtime::{FrameScheduler, ManualFrames, ViewEnvironment};
use fabulous_vdom::{Document, NodeRef, VNode, VdomBackend, h};

/// Everything a pipeline test needs
///
/// The document starts as `<section id="app"><div id="mount"></div></section>`
/// plus any extra mount points requested with [`with_mounts`](Self::with_mounts).
/// Frames only fire when the test says so.
pub struct PipelineFixture<B: Backend = VdomBackend> {
    document: Document,
    app: NodeRef,
    frames: ManualFrames,
    environment: ViewEnvironment<B>,
}

impl PipelineFixture<VdomBackend> {
    /// Fixture over the plain [`VdomBackend`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(VdomBackend)
    }
}

impl Default for PipelineFixture<VdomBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> PipelineFixture<B> {
    /// Fixture over a custom backend, e.g. [`FaultyBackend`](crate::mocks::FaultyBackend).
    #[must_use]
    pub fn with_backend(backend: B) -> Self {
        Self::build(backend, &["mount"])
    }

    /// Fixture with one `div` mount point per id, in order.
    #[must_use]
    pub fn with_mounts(backend: B, ids: &[&str]) -> Self {
        Self::build(backend, ids)
    }

    fn build(backend: B, ids: &[&str]) -> Self {
        let document = Document::new();
        let app = document.create(
            &h("section#app")
                .children(ids.iter().map(|id| h(&format!("div#{id}"))))
                .into_node(),
        );
        let frames = ManualFrames::new();
        let environment = ViewEnvironment::new(backend, FrameScheduler::new(frames.clone()));

        Self {
            document,
            app,
            frames,
            environment,
        }
    }

    /// The live document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The hand-fired frame source behind the scheduler
    #[must_use]
    pub const fn frames(&self) -> &ManualFrames {
        &self.frames
    }

    /// The shared scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &FrameScheduler {
        self.environment.scheduler()
    }

    /// Backend and scheduler for creating views
    #[must_use]
    pub const fn environment(&self) -> &ViewEnvironment<B> {
        &self.environment
    }

    /// The default `#mount` placeholder
    ///
    /// # Panics
    ///
    /// Panics if the fixture was built without a `mount` id, or the
    /// placeholder was already replaced.
    #[must_use]
    pub fn placeholder(&self) -> NodeRef {
        self.mount_point("mount")
    }

    /// The placeholder with the given id
    ///
    /// # Panics
    ///
    /// Panics if no element has that id.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn mount_point(&self, id: &str) -> NodeRef {
        self.document
            .element_by_id(id)
            .expect("fixture mount point should exist")
    }

    /// Inner HTML of the `#app` section
    #[must_use]
    pub fn html(&self) -> String {
        self.app.children().iter().map(NodeRef::to_html).collect()
    }
}

/// Render a list of strings as `<ul id="todo-list"><li>…</li></ul>`.
#[must_use]
pub fn list_tree<S: AsRef<str>>(items: &[S]) -> VNode {
    h("ul#todo-list")
        .children(items.iter().map(|item| h("li").text(item.as_ref())))
        .into_node()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_starts_with_an_empty_mount_point() {
        let fixture = PipelineFixture::new();
        assert_eq!(fixture.html(), r#"<div id="mount"></div>"#);
        assert_eq!(fixture.frames().requests(), 0);
    }

    #[test]
    fn extra_mount_points_keep_their_order() {
        let fixture = PipelineFixture::with_mounts(VdomBackend, &["a", "b"]);
        assert_eq!(fixture.html(), r#"<div id="a"></div><div id="b"></div>"#);
        assert_eq!(fixture.mount_point("b").attr("id").as_deref(), Some("b"));
    }

    #[test]
    fn list_tree_renders_items_in_order() {
        let tree = list_tree(&["a", "b"]);
        assert_eq!(
            tree.to_html(),
            r#"<ul id="todo-list"><li>a</li><li>b</li></ul>"#
        );
    }
}

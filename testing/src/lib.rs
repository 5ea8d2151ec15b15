//! # Fabulous Testing
//!
//! Testing utilities and fixtures for Fabulous view pipelines.
//!
//! This crate provides:
//! - A ready-made document, frame source and scheduler ([`PipelineFixture`])
//! - A backend that fails on demand ([`mocks::FaultyBackend`])
//! - A driver that fires frames whenever a view stream stalls
//!   ([`helpers::drive_with_frames`])
//! - Tracing setup for tests ([`init_test_tracing`])
//!
//! ## Example
//!
//! ```ignore
//! use fabulous_testing::{PipelineFixture, helpers::drive_with_frames};
//!
//! #[tokio::test]
//! async fn renders_list() {
//!     let fixture = PipelineFixture::new();
//!     let view = fixture.environment().create_view(
//!         "list",
//!         render_fn(|items: &Vec<String>| list_tree(items)),
//!         snapshots,
//!         fixture.placeholder(),
//!     );
//!
//!     let items = drive_with_frames(view, fixture.frames()).await;
//!     assert_eq!(fixture.html(), r#"<ul id="todo-list">...</ul>"#);
//! }
//! ```

/// Document and scheduler fixtures
pub mod fixture;

pub use fixture::{PipelineFixture, list_tree};

/// Mock backends for failure injection
pub mod mocks {
    use fabulous_core::Backend;
    use fabulous_vdom::{NodeRef, PatchSet, VNode, VdomBackend, VdomError};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    /// Errors returned by [`FaultyBackend`]
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum FaultError {
        /// A mount was set up to fail
        #[error("injected mount failure")]
        Mount,

        /// An apply call was set up to fail
        #[error("injected failure on apply call {call}")]
        Apply {
            /// 1-based number of the failing apply call
            call: usize,
        },

        /// The wrapped backend failed on its own
        #[error(transparent)]
        Vdom(#[from] VdomError),
    }

    /// [`VdomBackend`] that fails chosen calls without touching the document
    ///
    /// # Example
    ///
    /// ```
    /// use fabulous_testing::mocks::FaultyBackend;
    ///
    /// // second and fourth patches are rejected
    /// let backend = FaultyBackend::new().fail_apply(2).fail_apply(4);
    /// assert_eq!(backend.applies(), 0);
    /// ```
    #[derive(Debug, Default)]
    pub struct FaultyBackend {
        inner: VdomBackend,
        fail_mount: bool,
        fail_applies: BTreeSet<usize>,
        applies: AtomicUsize,
    }

    impl FaultyBackend {
        /// A backend that never fails on purpose
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every mount
        #[must_use]
        pub const fn fail_mount(mut self) -> Self {
            self.fail_mount = true;
            self
        }

        /// Fail the `call`-th apply (1-based)
        #[must_use]
        pub fn fail_apply(mut self, call: usize) -> Self {
            self.fail_applies.insert(call);
            self
        }

        /// Apply calls seen so far, failed ones included
        #[must_use]
        pub fn applies(&self) -> usize {
            self.applies.load(Ordering::SeqCst)
        }
    }

    impl Backend for FaultyBackend {
        type Tree = VNode;
        type Patch = PatchSet;
        type Surface = NodeRef;
        type Error = FaultError;

        fn mount(&self, placeholder: &NodeRef, tree: &VNode) -> Result<NodeRef, FaultError> {
            if self.fail_mount {
                return Err(FaultError::Mount);
            }
            Ok(self.inner.mount(placeholder, tree)?)
        }

        fn diff(&self, old: &VNode, new: &VNode) -> PatchSet {
            self.inner.diff(old, new)
        }

        fn apply(&self, surface: &NodeRef, patch: PatchSet) -> Result<NodeRef, FaultError> {
            let call = self.applies.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_applies.contains(&call) {
                return Err(FaultError::Apply { call });
            }
            Ok(self.inner.apply(surface, patch)?)
        }
    }
}

/// Helpers for driving view streams in tests
pub mod helpers {
    use fabulous_runtime::ManualFrames;
    use futures::{Stream, StreamExt};
    use std::future::poll_fn;
    use std::pin::pin;
    use std::task::Poll;

    /// Consecutive polls with nothing to fire before the driver gives up.
    const MAX_IDLE_POLLS: usize = 1_000;

    /// Drain `stream`, firing `frames` whenever it is waiting.
    ///
    /// Returns every item in order. If the stream stays pending with no
    /// frame to fire for [`MAX_IDLE_POLLS`] polls, the items collected so far
    /// are returned.
    pub async fn drive_with_frames<S: Stream>(stream: S, frames: &ManualFrames) -> Vec<S::Item> {
        let mut stream = pin!(stream);
        let mut items = Vec::new();
        let mut idle = 0;

        loop {
            let next = poll_fn(|cx| Poll::Ready(stream.poll_next_unpin(cx))).await;
            match next {
                Poll::Ready(Some(item)) => {
                    idle = 0;
                    items.push(item);
                }
                Poll::Ready(None) => return items,
                Poll::Pending => {
                    if frames.fire() > 0 {
                        idle = 0;
                        continue;
                    }
                    idle += 1;
                    if idle >= MAX_IDLE_POLLS {
                        tracing::warn!(items = items.len(), "Stream stalled with no frame to fire");
                        return items;
                    }
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    /// Split a view's output into passed-through values and errors.
    pub fn partition<T, E>(items: Vec<Result<T, E>>) -> (Vec<T>, Vec<E>) {
        let mut values = Vec::new();
        let mut errors = Vec::new();
        for item in items {
            match item {
                Ok(value) => values.push(value),
                Err(error) => errors.push(error),
            }
        }
        (values, errors)
    }
}

/// Install a `tracing` subscriber writing through the test harness.
///
/// Honours `RUST_LOG` and defaults to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Another test may have installed one already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

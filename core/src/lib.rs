//! # Fabulous Core
//!
//! Core traits and types for the Fabulous view reconciliation pipeline.
//!
//! This crate defines the vocabulary shared by every part of the pipeline. It
//! contains no scheduling and no async machinery; those live in
//! `fabulous-runtime`.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: A single application-state value emitted by a producer
//! - **Render**: Pure function `data → tree` describing the desired output
//! - **Backend**: The tree differ/patcher that owns the live output surface
//! - **ViewState**: Either `Unmounted` (placeholder only) or `Mounted` (surface + tree)
//! - **FrameSource**: The platform's "run this on the next display refresh" primitive
//!
//! ## Data Flow
//!
//! ```text
//! Snapshot ──render──▶ Tree ──diff(old, new)──▶ Patch ──apply──▶ Surface
//!                                   ▲                               │
//!                                   └────────── ViewState ◀─────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use fabulous_core::{Snapshot, render::{render_fn, Render}};
//!
//! let snapshot = Snapshot::new(vec!["a", "b"]);
//! let count = snapshot.map(|items| items.len());
//! assert_eq!(*count.get(), 2);
//!
//! let render = render_fn(|n: &usize| format!("{n} items"));
//! assert_eq!(render.render(count.get()).ok(), Some("2 items".to_string()));
//! ```

pub use serde::{Deserialize, Serialize};

/// Backend module - the tree differ/patcher capability
pub mod backend;

/// Render module - render functions and their failures
pub mod render;

/// Snapshot module - single-value state containers
pub mod snapshot;

/// View state module - the two-state render tag
pub mod view_state;

/// Environment module - Platform capabilities injected into the runtime
///
/// All platform dependencies of the pipeline are abstracted behind traits so
/// that tests can drive them deterministically.
pub mod environment {
    /// Callback run by a [`FrameSource`] on the next display refresh.
    pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

    /// `FrameSource` trait - the platform's next-refresh primitive
    ///
    /// Implementations must run every requested callback exactly once, on the
    /// next refresh tick after the request, in request order. A source that
    /// never ticks leaves callers waiting forever; that is not reported as an
    /// error.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - driven by a timer aligned to the display rate
    /// let frames = IntervalFrames::spawn(Duration::from_millis(16));
    ///
    /// // Test - fired by hand
    /// let frames = ManualFrames::new();
    /// frames.request_frame(Box::new(|| println!("tick")));
    /// frames.fire();
    /// ```
    pub trait FrameSource: Send + Sync {
        /// Run `callback` on the next refresh tick.
        fn request_frame(&self, callback: FrameCallback);
    }

    impl<F> FrameSource for std::sync::Arc<F>
    where
        F: FrameSource + ?Sized,
    {
        fn request_frame(&self, callback: FrameCallback) {
            (**self).request_frame(callback);
        }
    }
}

// Re-export commonly used items
pub use backend::Backend;
pub use environment::{FrameCallback, FrameSource};
pub use render::{Render, RenderError};
pub use snapshot::Snapshot;
pub use view_state::ViewState;

//! # Fabulous Runtime
//!
//! Runtime implementation for the Fabulous view reconciliation pipeline.
//!
//! This crate turns a stream of application-state snapshots into mutations of
//! a live output surface, coalescing bursts of updates into at most one flush
//! per display refresh.
//!
//! ## Core Components
//!
//! - **`FrameScheduler`**: Batches deferred mutation tasks and flushes them on
//!   the next refresh tick, in enqueue order
//! - **`RenderMachine`**: Decides between the initial mount and an incremental
//!   patch for each snapshot
//! - **`Sequencer`**: Single-slot mailbox holding the in-flight step, so no two
//!   steps for one surface ever overlap
//! - **`create_view`**: Folds a snapshot stream through the machine and
//!   re-emits each value unchanged
//!
//! ## Example
//!
//! ```ignore
//! use fabulous_runtime::{FrameScheduler, IntervalFrames, RenderMachine, create_view};
//!
//! let scheduler = FrameScheduler::new(IntervalFrames::spawn(Duration::from_millis(16)));
//! let machine = RenderMachine::new(render_fn(render_list), VdomBackend, scheduler)
//!     .named("todo-list");
//!
//! let mut output = Box::pin(create_view(machine, snapshots, placeholder));
//! while let Some(item) = output.next().await {
//!     // each snapshot value, passed through after its step was submitted
//! }
//! ```

use std::time::Duration;

/// Frame sources driving the scheduler
pub mod frames;

/// Render state machine
pub mod machine;

/// Prometheus metrics for observability
pub mod metrics;

/// Frame-batched task scheduler
pub mod scheduler;

/// Single-slot sequencing of in-flight steps
pub mod sequencer;

/// Stream adapter and view environment
pub mod view;

/// Error types for the view pipeline
pub mod error {
    use fabulous_core::RenderError;
    use thiserror::Error;

    /// Boxed backend error, erasing the backend's concrete error type
    pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

    /// Errors that can occur while a view pipeline processes snapshots
    ///
    /// `Render`, `Mount` and `Patch` are recoverable: the pipeline keeps its
    /// last good state and moves on to the next snapshot. `TaskDropped` loses
    /// the state that was in flight, so the pipeline halts after reporting it.
    #[derive(Error, Debug)]
    pub enum ViewError {
        /// The render function failed for a snapshot
        ///
        /// No task is enqueued and the view keeps its previous state.
        #[error(transparent)]
        Render(#[from] RenderError),

        /// The backend failed to mount the first tree
        ///
        /// The view stays unmounted on its placeholder.
        #[error("mount failed: {0}")]
        Mount(#[source] BoxError),

        /// The backend rejected a patch
        ///
        /// Delivered through the task's handle. Other tasks of the same flush
        /// are unaffected.
        #[error("patch failed: {0}")]
        Patch(#[source] BoxError),

        /// A task was dropped before it produced a result
        ///
        /// Either the task panicked during its flush, or the scheduler that
        /// owned it went away.
        #[error("task {task} was dropped before it produced a result")]
        TaskDropped {
            /// Id assigned by the scheduler at enqueue time
            task: u64,
        },

        /// The pipeline already stopped after an unrecoverable failure
        #[error("view pipeline halted after an unrecoverable failure")]
        Halted,
    }

    impl ViewError {
        /// Check if the pipeline can continue from its last good state
        #[must_use]
        pub const fn is_recoverable(&self) -> bool {
            matches!(self, Self::Render(_) | Self::Mount(_) | Self::Patch(_))
        }
    }
}

/// Configuration for the runtime
///
/// # Example
///
/// ```
/// use fabulous_runtime::RuntimeConfig;
/// use std::time::Duration;
///
/// let config = RuntimeConfig::default()
///     .with_frame_interval(Duration::from_millis(8))
///     .with_slow_flush_threshold(Duration::from_millis(4));
///
/// assert_eq!(config.frame_interval, Duration::from_millis(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Period of the refresh tick driven by [`frames::IntervalFrames`]
    pub frame_interval: Duration,
    /// Flushes taking longer than this are logged as warnings
    pub slow_flush_threshold: Duration,
}

impl RuntimeConfig {
    /// Create a new configuration with custom values
    ///
    /// # Arguments
    ///
    /// - `frame_interval`: Period of the refresh tick
    /// - `slow_flush_threshold`: Flush duration above which a warning is logged
    #[must_use]
    pub const fn new(frame_interval: Duration, slow_flush_threshold: Duration) -> Self {
        Self {
            frame_interval,
            slow_flush_threshold,
        }
    }

    /// Set the refresh tick period
    #[must_use]
    pub const fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the slow flush warning threshold
    #[must_use]
    pub const fn with_slow_flush_threshold(mut self, threshold: Duration) -> Self {
        self.slow_flush_threshold = threshold;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        // 60 Hz
        Self {
            frame_interval: Duration::from_micros(16_667),
            slow_flush_threshold: Duration::from_micros(16_667),
        }
    }
}

// Re-export commonly used items
pub use error::ViewError;
pub use frames::{IntervalFrames, ManualFrames};
pub use machine::{RenderMachine, Step, StepFailure, StepResult};
pub use scheduler::{FrameScheduler, SchedulerPhase, SchedulerStats, TaskHandle};
pub use sequencer::Sequencer;
pub use view::{ViewEnvironment, create_view};

#[cfg(test)]
mod tests {
    use super::*;
    use fabulous_core::RenderError;

    #[test]
    fn default_config_targets_sixty_hertz() {
        let config = RuntimeConfig::default();
        assert_eq!(config.frame_interval, Duration::from_micros(16_667));
        assert_eq!(config.slow_flush_threshold, config.frame_interval);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = RuntimeConfig::new(Duration::from_millis(1), Duration::from_millis(2))
            .with_frame_interval(Duration::from_millis(5));
        assert_eq!(config.frame_interval, Duration::from_millis(5));
        assert_eq!(config.slow_flush_threshold, Duration::from_millis(2));
    }

    #[test]
    fn render_errors_convert_and_stay_transparent() {
        let error: ViewError = RenderError::new("boom").into();
        assert!(error.is_recoverable());
        assert_eq!(error.to_string(), "render failed: boom");
    }

    #[test]
    fn dropped_tasks_are_not_recoverable() {
        let error = ViewError::TaskDropped { task: 3 };
        assert!(!error.is_recoverable());
        assert_eq!(
            error.to_string(),
            "task 3 was dropped before it produced a result"
        );
    }
}

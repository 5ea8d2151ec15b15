//! Render state machine.
//!
//! [`RenderMachine::advance`] turns the previous [`ViewState`] and a new
//! state value into the next step:
//!
//! - `Unmounted`: render, then mount synchronously in place of the
//!   placeholder. First paint never waits for a frame.
//! - `Mounted`: render, diff against the previous tree, and enqueue a task
//!   that applies the patch on the next flush.
//!
//! Failures carry the state to resume from, so a bad snapshot never corrupts
//! the view.

use crate::error::{BoxError, ViewError};
use crate::metrics::ViewMetrics;
use crate::scheduler::{FrameScheduler, TaskHandle};
use fabulous_core::{Backend, Render, ViewState};
use std::fmt;
use std::sync::Arc;

/// A failed step
pub struct StepFailure<B: Backend> {
    /// What went wrong
    pub error: ViewError,
    /// State to continue from, or `None` if it was lost with the task
    pub recovered: Option<ViewState<B>>,
}

impl<B: Backend> StepFailure<B> {
    /// A failure that leaves the view in `state`.
    #[must_use]
    pub const fn recoverable(error: ViewError, state: ViewState<B>) -> Self {
        Self {
            error,
            recovered: Some(state),
        }
    }

    /// A failure that lost the view's state.
    #[must_use]
    pub const fn unrecoverable(error: ViewError) -> Self {
        Self {
            error,
            recovered: None,
        }
    }
}

impl<B: Backend> fmt::Debug for StepFailure<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFailure")
            .field("error", &self.error)
            .field("recovered", &self.recovered.as_ref().map(ViewState::is_mounted))
            .finish()
    }
}

/// Outcome of one step
pub type StepResult<B> = Result<ViewState<B>, StepFailure<B>>;

/// The next view state, either known now or produced by a queued task
#[must_use = "a step must be settled before the view can advance again"]
pub enum Step<B: Backend> {
    /// Mounts and failures are known immediately
    Ready(StepResult<B>),
    /// Patches resolve when their flush runs
    Pending(TaskHandle<StepResult<B>>),
}

impl<B: Backend> Step<B> {
    /// Check if the step is waiting on a flush
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for the step's outcome.
    ///
    /// # Errors
    ///
    /// Returns the step's failure. A task that was dropped before it ran
    /// yields a failure with no recovered state.
    pub async fn settle(self) -> StepResult<B> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(handle) => match handle.await {
                Ok(result) => result,
                Err(error) => Err(StepFailure::unrecoverable(error)),
            },
        }
    }
}

impl<B: Backend> fmt::Debug for Step<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(Ok(state)) => write!(f, "Step::Ready(Ok(mounted: {}))", state.is_mounted()),
            Self::Ready(Err(failure)) => write!(f, "Step::Ready(Err({failure:?}))"),
            Self::Pending(handle) => write!(f, "Step::Pending(task {})", handle.id()),
        }
    }
}

/// Render state machine for one (render function, surface) pairing
///
/// Holds the render function, the backend and the scheduler that defers
/// patches. The view state itself is threaded through
/// [`advance`](Self::advance) by the caller.
pub struct RenderMachine<R, B> {
    name: Arc<str>,
    render: R,
    backend: Arc<B>,
    scheduler: FrameScheduler,
}

impl<R, B: Backend> RenderMachine<R, B> {
    /// Create a machine owning its backend.
    #[must_use]
    pub fn new(render: R, backend: B, scheduler: FrameScheduler) -> Self {
        Self::shared(render, Arc::new(backend), scheduler)
    }

    /// Create a machine sharing a backend with other machines.
    #[must_use]
    pub fn shared(render: R, backend: Arc<B>, scheduler: FrameScheduler) -> Self {
        Self {
            name: Arc::from("view"),
            render,
            backend,
            scheduler,
        }
    }

    /// Name the view for logs and metrics.
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// The view's name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheduler patches are deferred to
    #[must_use]
    pub const fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Compute the next step from `prev` and `data`.
    ///
    /// Rendering happens now. A mount also happens now; a patch is queued on
    /// the scheduler and the returned step is pending until it runs.
    pub fn advance<T>(&self, prev: ViewState<B>, data: &T) -> Step<B>
    where
        T: ?Sized,
        R: Render<T, Tree = B::Tree>,
    {
        let span = tracing::debug_span!(
            "advance",
            view = %self.name,
            mounted = prev.is_mounted()
        );
        let _entered = span.enter();

        let tree = match self.render.render(data) {
            Ok(tree) => tree,
            Err(error) => {
                ViewMetrics::record_render_failure(&self.name);
                tracing::warn!(error = %error, "Render failed; keeping previous state");
                return Step::Ready(Err(StepFailure::recoverable(error.into(), prev)));
            }
        };

        match prev {
            ViewState::Unmounted { placeholder } => self.mount(placeholder, tree),
            ViewState::Mounted {
                surface,
                tree: old,
            } => self.patch(surface, old, tree),
        }
    }

    fn mount(&self, placeholder: B::Surface, tree: B::Tree) -> Step<B> {
        match self.backend.mount(&placeholder, &tree) {
            Ok(surface) => {
                ViewMetrics::record_mount(&self.name);
                tracing::debug!("Mounted");
                Step::Ready(Ok(ViewState::Mounted { surface, tree }))
            }
            Err(error) => {
                ViewMetrics::record_mount_failure(&self.name);
                tracing::warn!(error = %error, "Mount failed; staying unmounted");
                Step::Ready(Err(StepFailure::recoverable(
                    ViewError::Mount(Box::new(error)),
                    ViewState::Unmounted { placeholder },
                )))
            }
        }
    }

    fn patch(&self, surface: B::Surface, old: B::Tree, new: B::Tree) -> Step<B> {
        let patch = self.backend.diff(&old, &new);
        let backend = Arc::clone(&self.backend);
        let name = Arc::clone(&self.name);

        let handle = self.scheduler.enqueue(move || {
            match backend.apply(&surface, patch) {
                Ok(surface) => {
                    ViewMetrics::record_patch(&name);
                    Ok(ViewState::Mounted { surface, tree: new })
                }
                Err(error) => {
                    ViewMetrics::record_patch_failure(&name);
                    tracing::warn!(
                        view = %name,
                        error = %error,
                        "Patch rejected; keeping previous state"
                    );
                    let error: BoxError = Box::new(error);
                    Err(StepFailure::recoverable(
                        ViewError::Patch(error),
                        ViewState::Mounted { surface, tree: old },
                    ))
                }
            }
        });

        tracing::trace!(task = handle.id(), "Patch queued");
        Step::Pending(handle)
    }
}

impl<R, B> fmt::Debug for RenderMachine<R, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderMachine")
            .field("name", &self.name)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

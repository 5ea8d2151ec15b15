//! Stream adapter: snapshots in, the same values out.
//!
//! [`create_view`] folds a snapshot stream through a [`RenderMachine`] with a
//! [`Sequencer`] as the accumulator. The output stream re-emits each value
//! unchanged once its step has been submitted, so several views can be
//! merged and drained together. Failures are yielded as `Err` items in
//! between the values.

use crate::RuntimeConfig;
use crate::error::ViewError;
use crate::frames::IntervalFrames;
use crate::machine::RenderMachine;
use crate::scheduler::FrameScheduler;
use crate::sequencer::Sequencer;
use async_stream::stream;
use fabulous_core::{Backend, Render, Snapshot, ViewState};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Render a stream of snapshots onto `surface`.
///
/// The first snapshot mounts synchronously in place of `surface`; every
/// later one is patched on the machine's scheduler. Each value is yielded as
/// `Ok` after its step was submitted, before that step's flush.
///
/// Recoverable failures are yielded as `Err` and the view carries on from
/// its last good state. A failure that loses the state is yielded as `Err`
/// and ends the stream. When the snapshot stream ends, the last in-flight
/// step is awaited so its patch lands before the output completes.
///
/// # Example
///
/// ```ignore
/// let output = create_view(machine, snapshots, placeholder);
/// let values: Vec<_> = output.filter_map(|item| async { item.ok() }).collect().await;
/// ```
pub fn create_view<T, R, B, S>(
    machine: RenderMachine<R, B>,
    snapshots: S,
    surface: B::Surface,
) -> impl Stream<Item = Result<T, ViewError>> + Send
where
    T: Send + Sync,
    R: Render<T, Tree = B::Tree> + Send + Sync,
    B: Backend,
    S: Stream<Item = Snapshot<T>> + Send,
{
    stream! {
        let mut snapshots = std::pin::pin!(snapshots);
        let mut sequencer = Sequencer::new(ViewState::unmounted(surface));

        while let Some(snapshot) = snapshots.next().await {
            let data = snapshot.into_inner();

            match sequencer.fold(|prev| machine.advance(prev, &data)).await {
                Ok(failures) => {
                    for error in failures {
                        yield Err(error);
                    }
                }
                Err(error) => {
                    tracing::error!(view = machine.name(), error = %error, "View halted");
                    yield Err(error);
                    break;
                }
            }

            yield Ok(data);
        }

        if !sequencer.is_halted() {
            let folds = sequencer.folds();
            match sequencer.finish().await {
                Ok(state) => tracing::debug!(
                    view = machine.name(),
                    folds,
                    mounted = state.is_mounted(),
                    "View completed"
                ),
                Err(error) => yield Err(error),
            }
        }
    }
}

/// Backend and scheduler shared by a group of views
///
/// Views created from one environment batch their patches into the same
/// flushes.
pub struct ViewEnvironment<B> {
    backend: Arc<B>,
    scheduler: FrameScheduler,
}

impl<B: Backend> ViewEnvironment<B> {
    /// Create an environment from its parts.
    #[must_use]
    pub fn new(backend: B, scheduler: FrameScheduler) -> Self {
        Self {
            backend: Arc::new(backend),
            scheduler,
        }
    }

    /// Create an environment ticking at [`RuntimeConfig::frame_interval`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn from_config(backend: B, config: &RuntimeConfig) -> Self {
        let frames = IntervalFrames::from_config(config);
        Self::new(backend, FrameScheduler::with_config(frames, config))
    }

    /// The shared scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// The shared backend
    #[must_use]
    pub const fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Build a machine named `name` for `render`.
    #[must_use]
    pub fn machine<R>(&self, name: &str, render: R) -> RenderMachine<R, B> {
        RenderMachine::shared(render, Arc::clone(&self.backend), self.scheduler.clone()).named(name)
    }

    /// Render `snapshots` onto `surface` with a view named `name`.
    ///
    /// See [`create_view`].
    pub fn create_view<T, R, S>(
        &self,
        name: &str,
        render: R,
        snapshots: S,
        surface: B::Surface,
    ) -> impl Stream<Item = Result<T, ViewError>> + Send + use<T, R, S, B>
    where
        T: Send + Sync,
        R: Render<T, Tree = B::Tree> + Send + Sync,
        S: Stream<Item = Snapshot<T>> + Send,
    {
        create_view(self.machine(name, render), snapshots, surface)
    }
}

impl<B> Clone for ViewEnvironment<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<B> std::fmt::Debug for ViewEnvironment<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewEnvironment")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frames::ManualFrames;
    use fabulous_core::render::render_fn;
    use futures::stream;
    use std::convert::Infallible;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        applied: Mutex<Vec<usize>>,
    }

    impl Backend for Log {
        type Tree = usize;
        type Patch = usize;
        type Surface = ();
        type Error = Infallible;

        fn mount(&self, (): &(), _tree: &usize) -> Result<(), Infallible> {
            Ok(())
        }

        fn diff(&self, _old: &usize, new: &usize) -> usize {
            *new
        }

        fn apply(&self, (): &(), patch: usize) -> Result<(), Infallible> {
            self.applied.lock().unwrap().push(patch);
            Ok(())
        }
    }

    #[tokio::test]
    async fn values_pass_through_unchanged() {
        let frames = ManualFrames::new();
        let environment = ViewEnvironment::new(Log::default(), FrameScheduler::new(frames.clone()));
        let snapshots = stream::iter(vec![vec![1], vec![1, 2]].into_iter().map(Snapshot::new));

        let output = environment.create_view("len", render_fn(Vec::<u8>::len), snapshots, ());
        let mut output = std::pin::pin!(output);

        assert_eq!(output.next().await.unwrap().unwrap(), vec![1]);
        assert_eq!(output.next().await.unwrap().unwrap(), vec![1, 2]);

        // the second value's patch is queued; the stream ends once it lands
        assert_eq!(frames.pending(), 1);
        frames.fire();
        assert!(output.next().await.is_none());

        assert_eq!(*environment.backend().applied.lock().unwrap(), vec![2]);
    }
}

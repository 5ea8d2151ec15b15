//! Single-slot sequencing of in-flight steps.
//!
//! The slot holds the step produced for the latest snapshot. Folding the
//! next snapshot first waits for that step in place, then takes its outcome
//! and advances the machine. Every patch therefore diffs against the tree of the
//! immediately preceding snapshot, and at most one step per surface is ever
//! in flight.

use crate::error::ViewError;
use crate::machine::{Step, StepFailure};
use fabulous_core::{Backend, ViewState};
use smallvec::SmallVec;

/// Failures collected by one fold: at most the settled previous step and the
/// immediate failure of the new one.
pub type FoldFailures = SmallVec<[ViewError; 2]>;

/// Single-slot mailbox threading [`ViewState`] through a sequence of steps
pub struct Sequencer<B: Backend> {
    slot: Option<Step<B>>,
    folds: u64,
}

impl<B: Backend> Sequencer<B> {
    /// Start from `initial`, usually [`ViewState::unmounted`].
    #[must_use]
    pub const fn new(initial: ViewState<B>) -> Self {
        Self {
            slot: Some(Step::Ready(Ok(initial))),
            folds: 0,
        }
    }

    /// Wait for the step in the slot, then put `advance(state)` in its place.
    ///
    /// Recoverable failures, of the settled step or of the new step, are
    /// returned and the fold continues from the state they carry.
    ///
    /// # Errors
    ///
    /// Returns the failure that lost the view state (a dropped task), or
    /// [`ViewError::Halted`] if that already happened. The sequencer stays
    /// halted and `advance` is not called.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future while it waits leaves the pending step
    /// in the slot; the next fold waits for it again.
    pub async fn fold<F>(&mut self, advance: F) -> Result<FoldFailures, ViewError>
    where
        F: FnOnce(ViewState<B>) -> Step<B>,
    {
        if let Some(Step::Pending(handle)) = &mut self.slot {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(error) => Err(StepFailure::unrecoverable(error)),
            };
            self.slot = Some(Step::Ready(outcome));
        }

        let step = self.slot.take().ok_or(ViewError::Halted)?;
        let mut failures = FoldFailures::new();

        let state = match step.settle().await {
            Ok(state) => state,
            Err(StepFailure {
                error,
                recovered: Some(state),
            }) => {
                failures.push(error);
                state
            }
            Err(StepFailure {
                error,
                recovered: None,
            }) => {
                tracing::error!(error = %error, "View state lost; halting");
                return Err(error);
            }
        };

        let next = match advance(state) {
            Step::Ready(Err(StepFailure {
                error,
                recovered: Some(state),
            })) => {
                failures.push(error);
                Step::Ready(Ok(state))
            }
            step => step,
        };

        self.slot = Some(next);
        self.folds += 1;
        Ok(failures)
    }

    /// Wait for the last step and return the final state.
    ///
    /// # Errors
    ///
    /// Returns the last step's failure, or [`ViewError::Halted`] if the
    /// sequencer already halted.
    pub async fn finish(self) -> Result<ViewState<B>, ViewError> {
        let step = self.slot.ok_or(ViewError::Halted)?;
        step.settle().await.map_err(|failure| failure.error)
    }

    /// Check if the slot holds a step waiting on a flush
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.slot.as_ref().is_some_and(Step::is_pending)
    }

    /// Check if the view state was lost
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.slot.is_none()
    }

    /// Number of successful folds
    #[must_use]
    pub const fn folds(&self) -> u64 {
        self.folds
    }
}

impl<B: Backend> std::fmt::Debug for Sequencer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("slot", &self.slot)
            .field("folds", &self.folds)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::frames::ManualFrames;
    use crate::machine::RenderMachine;
    use crate::scheduler::FrameScheduler;
    use fabulous_core::render::{TryRenderFn, try_render_fn};
    use fabulous_core::RenderError;
    use std::convert::Infallible;
    use tokio_test::{assert_pending, assert_ready, task};

    struct Strings;

    impl Backend for Strings {
        type Tree = String;
        type Patch = String;
        type Surface = ();
        type Error = Infallible;

        fn mount(&self, (): &(), _tree: &String) -> Result<(), Infallible> {
            Ok(())
        }

        fn diff(&self, _old: &String, new: &String) -> String {
            new.clone()
        }

        fn apply(&self, (): &(), _patch: String) -> Result<(), Infallible> {
            Ok(())
        }
    }

    type Machine = RenderMachine<TryRenderFn<fn(&str) -> Result<String, RenderError>>, Strings>;

    fn render_word(word: &str) -> Result<String, RenderError> {
        if word.is_empty() {
            Err(RenderError::new("empty"))
        } else {
            Ok(word.to_string())
        }
    }

    fn machine(frames: &ManualFrames) -> Machine {
        RenderMachine::new(
            try_render_fn(render_word as fn(&str) -> Result<String, RenderError>),
            Strings,
            FrameScheduler::new(frames.clone()),
        )
    }

    #[test]
    fn next_fold_waits_for_the_pending_patch() {
        let frames = ManualFrames::new();
        let machine = machine(&frames);
        let mut sequencer = Sequencer::new(ViewState::unmounted(()));

        // mount, then queue a patch
        let mut first = task::spawn(sequencer.fold(|prev| machine.advance(prev, "a")));
        assert!(assert_ready!(first.poll()).unwrap().is_empty());
        drop(first);
        let mut second = task::spawn(sequencer.fold(|prev| machine.advance(prev, "b")));
        assert_ready!(second.poll()).unwrap();
        drop(second);
        assert!(sequencer.is_in_flight());

        let mut third = task::spawn(sequencer.fold(|prev| {
            assert_eq!(prev.tree().map(String::as_str), Some("b"));
            machine.advance(prev, "c")
        }));
        assert_pending!(third.poll());
        assert_eq!(frames.requests(), 1);

        frames.fire();
        assert!(third.is_woken());
        assert_ready!(third.poll()).unwrap();
        drop(third);
        assert_eq!(sequencer.folds(), 3);
    }

    #[test]
    fn dropping_a_waiting_fold_keeps_the_pending_step() {
        let frames = ManualFrames::new();
        let machine = machine(&frames);
        let mut sequencer = Sequencer::new(ViewState::unmounted(()));

        for word in ["a", "b"] {
            let mut fold = task::spawn(sequencer.fold(|prev| machine.advance(prev, word)));
            assert_ready!(fold.poll()).unwrap();
        }

        let mut abandoned = task::spawn(sequencer.fold(|prev| machine.advance(prev, "c")));
        assert_pending!(abandoned.poll());
        drop(abandoned);
        assert!(sequencer.is_in_flight());
        assert!(!sequencer.is_halted());

        frames.fire();
        let mut next = task::spawn(sequencer.fold(|prev| {
            assert_eq!(prev.tree().map(String::as_str), Some("b"));
            machine.advance(prev, "d")
        }));
        assert!(assert_ready!(next.poll()).unwrap().is_empty());
        drop(next);
        assert_eq!(sequencer.folds(), 3);
        assert!(!sequencer.is_halted());
    }

    #[tokio::test]
    async fn immediate_failures_are_reported_and_state_kept() {
        let frames = ManualFrames::new();
        let machine = machine(&frames);
        let mut sequencer = Sequencer::new(ViewState::unmounted(()));

        sequencer.fold(|prev| machine.advance(prev, "a")).await.unwrap();
        let failures = sequencer.fold(|prev| machine.advance(prev, "")).await.unwrap();

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], ViewError::Render(_)));
        assert!(!sequencer.is_in_flight());

        let state = sequencer.finish().await.unwrap();
        assert_eq!(state.tree().map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn lost_state_halts_the_sequencer() {
        let frames = ManualFrames::new();
        let machine = machine(&frames);
        let mut sequencer = Sequencer::new(ViewState::unmounted(()));

        sequencer.fold(|prev| machine.advance(prev, "a")).await.unwrap();
        // the patch task is queued on a scheduler nobody will flush
        sequencer
            .fold(|prev| {
                let orphan = FrameScheduler::new(ManualFrames::new());
                let handle = orphan.enqueue(move || Ok(prev));
                Step::Pending(handle)
            })
            .await
            .unwrap();

        let error = sequencer
            .fold(|_| panic!("must not advance after losing state"))
            .await
            .unwrap_err();
        assert!(matches!(error, ViewError::TaskDropped { .. }));
        assert!(sequencer.is_halted());

        let again = sequencer.fold(|prev| machine.advance(prev, "b")).await;
        assert!(matches!(again, Err(ViewError::Halted)));
        assert!(matches!(sequencer.finish().await, Err(ViewError::Halted)));
    }
}

//! [`FrameSource`] implementations.
//!
//! - [`IntervalFrames`]: a tokio task ticking at a fixed period, standing in
//!   for the display's refresh signal
//! - [`ManualFrames`]: fired by hand, for deterministic tests

use crate::RuntimeConfig;
use fabulous_core::{FrameCallback, FrameSource};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Refresh ticks driven by a tokio interval.
///
/// A request reaching an idle driver starts a tick one `period` later.
/// Every callback requested before that tick runs on it, in request order.
/// Callbacks requested while a tick is running wait for the next one.
/// The driver task exits once every clone of the source is dropped.
#[derive(Clone, Debug)]
pub struct IntervalFrames {
    requests: mpsc::UnboundedSender<FrameCallback>,
}

impl IntervalFrames {
    /// Spawn the driver task ticking every `period`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(period: Duration) -> Self {
        let (requests, receiver) = mpsc::unbounded_channel();
        tokio::spawn(drive(receiver, period));
        tracing::debug!(period_us = period.as_micros(), "Spawned frame driver");
        Self { requests }
    }

    /// Spawn the driver task using [`RuntimeConfig::frame_interval`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::spawn(config.frame_interval)
    }
}

impl FrameSource for IntervalFrames {
    fn request_frame(&self, callback: FrameCallback) {
        if self.requests.send(callback).is_err() {
            tracing::warn!("Frame driver has stopped; callback will never run");
        }
    }
}

async fn drive(mut requests: mpsc::UnboundedReceiver<FrameCallback>, period: Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while let Some(first) = requests.recv().await {
        // An idle ticker would fire at once
        ticker.reset();
        ticker.tick().await;

        let mut batch = vec![first];
        while let Ok(next) = requests.try_recv() {
            batch.push(next);
        }

        tracing::trace!(callbacks = batch.len(), "Frame tick");
        for callback in batch {
            callback();
        }
    }

    tracing::debug!("Frame driver stopped");
}

#[derive(Default)]
struct ManualState {
    pending: Vec<FrameCallback>,
    requested: usize,
    ticks: usize,
}

/// A frame source fired by hand.
///
/// Clones share the same pending list, so a test can hand one clone to a
/// scheduler and keep another to call [`fire`](Self::fire).
///
/// # Example
///
/// ```
/// use fabulous_core::FrameSource;
/// use fabulous_runtime::ManualFrames;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let frames = ManualFrames::new();
/// let ran = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&ran);
/// frames.request_frame(Box::new(move || flag.store(true, Ordering::SeqCst)));
///
/// assert!(!ran.load(Ordering::SeqCst));
/// assert_eq!(frames.fire(), 1);
/// assert!(ran.load(Ordering::SeqCst));
/// ```
#[derive(Clone, Default)]
pub struct ManualFrames {
    state: Arc<Mutex<ManualState>>,
}

impl ManualFrames {
    /// Create a source with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick: every callback requested so far, in request order.
    ///
    /// Callbacks requested while this tick runs are kept for the next one.
    /// Returns the number of callbacks run.
    pub fn fire(&self) -> usize {
        let batch = {
            let mut state = self.lock();
            state.ticks += 1;
            std::mem::take(&mut state.pending)
        };

        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }

    /// Callbacks waiting for the next tick
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Total callbacks ever requested
    #[must_use]
    pub fn requests(&self) -> usize {
        self.lock().requested
    }

    /// Total calls to [`fire`](Self::fire)
    #[must_use]
    pub fn ticks(&self) -> usize {
        self.lock().ticks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let mut state = self.lock();
        state.requested += 1;
        state.pending.push(callback);
    }
}

impl std::fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualFrames")
            .field("pending", &state.pending.len())
            .field("requested", &state.requested)
            .field("ticks", &state.ticks)
            .finish()
    }
}

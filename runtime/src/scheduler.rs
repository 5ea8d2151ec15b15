//! Frame-batched task scheduler.
//!
//! Any number of tasks enqueued within one refresh interval run together in a
//! single flush, in enqueue order. The first enqueue after a flush requests
//! exactly one frame callback; later enqueues ride along with it.
//!
//! ```text
//!          enqueue                 frame fires            batch done
//!   Idle ───────────▶ FlushPending ──────────▶ Draining ──────────▶ Idle
//!                          ▲                      │
//!                          └──── enqueue ─────────┘ (new batch)
//! ```
//!
//! A flush swaps the live queue for an empty one before running anything, so
//! tasks enqueued by a running task start a fresh batch on the next frame.

use crate::RuntimeConfig;
use crate::error::ViewError;
use crate::metrics::SchedulerMetrics;
use fabulous_core::FrameSource;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where the scheduler is in its flush cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Nothing queued, no frame requested
    Idle,
    /// A frame callback is requested and tasks are waiting for it
    FlushPending,
    /// A flush is running its batch
    Draining,
}

/// Counters describing what a scheduler has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks ever enqueued
    pub enqueued: u64,
    /// Frame callbacks requested
    pub frames_requested: u64,
    /// Flushes completed
    pub flushes: u64,
    /// Tasks run by completed flushes, including ones that panicked
    pub tasks_run: u64,
    /// Tasks that panicked
    pub tasks_panicked: u64,
    /// Largest batch run by one flush
    pub largest_batch: usize,
}

#[derive(Default)]
struct Queue {
    tasks: Vec<Job>,
    flush_pending: bool,
    draining: bool,
    next_id: u64,
    stats: SchedulerStats,
}

struct Shared {
    queue: Mutex<Queue>,
    frames: Arc<dyn FrameSource>,
    slow_flush_threshold: Duration,
}

/// Frame-batched task scheduler
///
/// Cloning is cheap and clones share one queue, so several view pipelines
/// can deliberately batch their patches into the same flush. Pipelines that
/// should not share frames get their own scheduler.
///
/// # Example
///
/// ```
/// use fabulous_runtime::{FrameScheduler, ManualFrames, SchedulerPhase};
///
/// let frames = ManualFrames::new();
/// let scheduler = FrameScheduler::new(frames.clone());
///
/// let a = scheduler.enqueue(|| 1);
/// let b = scheduler.enqueue(|| 2);
/// assert_eq!(frames.requests(), 1);
/// assert_eq!(scheduler.phase(), SchedulerPhase::FlushPending);
///
/// frames.fire();
/// assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
/// # drop((a, b));
/// ```
#[derive(Clone)]
pub struct FrameScheduler {
    shared: Arc<Shared>,
}

impl FrameScheduler {
    /// Create a scheduler flushing on ticks of `frames`.
    #[must_use]
    pub fn new<F: FrameSource + 'static>(frames: F) -> Self {
        Self::with_config(frames, &RuntimeConfig::default())
    }

    /// Create a scheduler with custom configuration.
    #[must_use]
    pub fn with_config<F: FrameSource + 'static>(frames: F, config: &RuntimeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue::default()),
                frames: Arc::new(frames),
                slow_flush_threshold: config.slow_flush_threshold,
            }),
        }
    }

    /// Queue `op` to run on the next flush.
    ///
    /// Requests a frame callback only if none is pending. The returned handle
    /// resolves with `op`'s result once it has run, or with
    /// [`ViewError::TaskDropped`] if `op` panicked or the scheduler was
    /// dropped first.
    pub fn enqueue<T, F>(&self, op: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job: Job = Box::new(move || {
            if sender.send(op()).is_err() {
                tracing::trace!("Task handle dropped before its result was delivered");
            }
        });

        let (id, request_frame) = {
            let mut queue = self.lock();
            let id = queue.next_id;
            queue.next_id += 1;
            queue.tasks.push(job);
            queue.stats.enqueued += 1;

            let request_frame = !queue.flush_pending;
            if request_frame {
                queue.flush_pending = true;
                queue.stats.frames_requested += 1;
            }

            SchedulerMetrics::record_enqueue(queue.tasks.len());
            tracing::trace!(task = id, depth = queue.tasks.len(), "Task enqueued");
            (id, request_frame)
        };

        // The frame source may run the callback synchronously, so the lock
        // must be released first.
        if request_frame {
            SchedulerMetrics::record_frame_request();
            let shared = Arc::downgrade(&self.shared);
            self.shared.frames.request_frame(Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    Self { shared }.flush();
                } else {
                    tracing::debug!("Scheduler dropped before its frame fired");
                }
            }));
        }

        TaskHandle { id, receiver }
    }

    /// Current phase of the flush cycle
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        let queue = self.lock();
        if queue.draining {
            SchedulerPhase::Draining
        } else if queue.flush_pending {
            SchedulerPhase::FlushPending
        } else {
            SchedulerPhase::Idle
        }
    }

    /// Tasks waiting for the next flush
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Snapshot of the scheduler's counters
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.lock().stats
    }

    #[tracing::instrument(skip(self), name = "scheduler_flush")]
    fn flush(&self) {
        let batch = {
            let mut queue = self.lock();
            queue.flush_pending = false;
            queue.draining = true;
            std::mem::take(&mut queue.tasks)
        };

        let size = batch.len();
        let started = Instant::now();
        let mut panicked = 0_u64;

        for job in batch {
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                panicked += 1;
                SchedulerMetrics::record_panic();
                tracing::error!("Task panicked during flush; its handle resolves as dropped");
            }
        }

        let elapsed = started.elapsed();
        let remaining = {
            let mut queue = self.lock();
            queue.draining = false;
            queue.stats.flushes += 1;
            queue.stats.tasks_run += size as u64;
            queue.stats.tasks_panicked += panicked;
            queue.stats.largest_batch = queue.stats.largest_batch.max(size);
            queue.tasks.len()
        };

        SchedulerMetrics::record_flush(size, remaining, elapsed);
        if elapsed > self.shared.slow_flush_threshold {
            tracing::warn!(
                batch = size,
                elapsed_us = elapsed.as_micros(),
                threshold_us = self.shared.slow_flush_threshold.as_micros(),
                "Slow flush"
            );
        } else {
            tracing::debug!(batch = size, remaining, elapsed_us = elapsed.as_micros(), "Flushed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("phase", &self.phase())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Handle for one enqueued task
///
/// Resolves once the task has run in a flush. Dropping the handle does not
/// cancel the task; it still runs and its result is discarded.
#[derive(Debug)]
#[must_use = "a task handle does nothing unless awaited"]
pub struct TaskHandle<T> {
    id: u64,
    receiver: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Id assigned at enqueue time, increasing per scheduler
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, ViewError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| ViewError::TaskDropped { task: id }))
    }
}

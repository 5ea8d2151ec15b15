//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the pipeline:
//! - View mounts, patches and failures (labelled by view name)
//! - Scheduler enqueues, frame requests and flushes
//!
//! Recording is always on; without an installed recorder the macros are
//! no-ops.
//!
//! # Example
//!
//! ```rust,no_run
//! use fabulous_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! // ... run views ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder.
///
/// Installs a process-wide recorder and renders its contents on demand.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not yet installed.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g. by another test), this logs a
    /// warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.000_1, 0.000_5, 0.001, 0.002, 0.004, 0.008, 0.016, 0.033, 0.066, 0.1,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder was not the one installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // View Metrics
    describe_counter!(
        "fabulous_view_mounts_total",
        "Total number of initial mounts performed by views"
    );
    describe_counter!(
        "fabulous_view_patches_total",
        "Total number of patches applied by views"
    );
    describe_counter!(
        "fabulous_view_render_failures_total",
        "Total number of snapshots whose render function failed"
    );
    describe_counter!(
        "fabulous_view_mount_failures_total",
        "Total number of initial mounts rejected by the backend"
    );
    describe_counter!(
        "fabulous_view_patch_failures_total",
        "Total number of patches rejected by the backend"
    );

    // Scheduler Metrics
    describe_counter!(
        "fabulous_scheduler_tasks_enqueued_total",
        "Total number of tasks enqueued"
    );
    describe_counter!(
        "fabulous_scheduler_frames_requested_total",
        "Total number of refresh callbacks requested"
    );
    describe_counter!(
        "fabulous_scheduler_tasks_panicked_total",
        "Total number of tasks that panicked while running"
    );
    describe_gauge!(
        "fabulous_scheduler_queue_depth",
        "Tasks waiting for the next flush"
    );
    describe_histogram!(
        "fabulous_scheduler_batch_size",
        "Number of tasks run per flush"
    );
    describe_histogram!(
        "fabulous_scheduler_flush_duration_seconds",
        "Time taken to run one flush"
    );
}

/// View metrics recorder.
pub struct ViewMetrics;

impl ViewMetrics {
    /// Record an initial mount.
    pub fn record_mount(view: &str) {
        counter!("fabulous_view_mounts_total", "view" => view.to_string()).increment(1);
    }

    /// Record an applied patch.
    pub fn record_patch(view: &str) {
        counter!("fabulous_view_patches_total", "view" => view.to_string()).increment(1);
    }

    /// Record a render failure.
    pub fn record_render_failure(view: &str) {
        counter!("fabulous_view_render_failures_total", "view" => view.to_string()).increment(1);
    }

    /// Record a mount rejected by the backend.
    pub fn record_mount_failure(view: &str) {
        counter!("fabulous_view_mount_failures_total", "view" => view.to_string()).increment(1);
    }

    /// Record a patch rejected by the backend.
    pub fn record_patch_failure(view: &str) {
        counter!("fabulous_view_patch_failures_total", "view" => view.to_string()).increment(1);
    }
}

/// Scheduler metrics recorder.
pub struct SchedulerMetrics;

impl SchedulerMetrics {
    /// Record an enqueue and the resulting queue depth.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_enqueue(depth: usize) {
        counter!("fabulous_scheduler_tasks_enqueued_total").increment(1);
        gauge!("fabulous_scheduler_queue_depth").set(depth as f64);
    }

    /// Record a refresh callback request.
    pub fn record_frame_request() {
        counter!("fabulous_scheduler_frames_requested_total").increment(1);
    }

    /// Record a completed flush and the tasks enqueued while it ran.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_flush(batch: usize, remaining: usize, duration: Duration) {
        histogram!("fabulous_scheduler_batch_size").record(batch as f64);
        histogram!("fabulous_scheduler_flush_duration_seconds").record(duration.as_secs_f64());
        gauge!("fabulous_scheduler_queue_depth").set(remaining as f64);
    }

    /// Record a task that panicked.
    pub fn record_panic() {
        counter!("fabulous_scheduler_tasks_panicked_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_starts_uninstalled() {
        let recorder = MetricsRecorder::new();
        assert!(recorder.handle().is_none());
        assert!(recorder.render().is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn install_and_render() {
        let mut recorder = MetricsRecorder::new();
        recorder.install().unwrap();

        ViewMetrics::record_mount("todo-list");
        ViewMetrics::record_mount_failure("metrics-view");
        ViewMetrics::record_patch_failure("metrics-view");
        SchedulerMetrics::record_flush(3, 0, Duration::from_millis(2));

        // If another test installed the recorder first, handle is None.
        // That's OK - metrics are still being recorded.
        if let Some(rendered) = recorder.render() {
            assert!(rendered.contains("fabulous_view_mounts_total"));
            assert!(rendered.contains(r#"fabulous_view_mount_failures_total{view="metrics-view"} 1"#));
            assert!(rendered.contains(r#"fabulous_view_patch_failures_total{view="metrics-view"} 1"#));
            assert!(rendered.contains("fabulous_scheduler_batch_size"));
        }
    }
}

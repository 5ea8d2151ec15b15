//! Reconciliation Benchmarks
//!
//! - Diffing list trees of growing size
//! - Flushing batches of queued tasks
//! - Driving a full view pipeline over a burst of snapshots
//!
//! Run with: `cargo bench -p fabulous-runtime`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fabulous_core::Snapshot;
use fabulous_core::render::render_fn;
use fabulous_runtime::{FrameScheduler, ManualFrames};
use fabulous_testing::helpers::drive_with_frames;
use fabulous_testing::{PipelineFixture, list_tree};
use fabulous_vdom::diff;
use futures::stream;

fn labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("todo {i}")).collect()
}

/// Benchmark diffing a list against itself plus one appended item
fn benchmark_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for size in [10, 100, 1_000, 5_000] {
        let old = list_tree(&labels(size));
        let new = list_tree(&labels(size + 1));
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("append_one", size), &size, |b, _| {
            b.iter(|| diff(black_box(&old), black_box(&new)));
        });
        group.bench_with_input(BenchmarkId::new("unchanged", size), &size, |b, _| {
            b.iter(|| diff(black_box(&old), black_box(&old)));
        });
    }

    group.finish();
}

/// Benchmark enqueue + flush of a batch of trivial tasks
fn benchmark_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");

    for batch in [1, 64, 1_024] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let frames = ManualFrames::new();
            let scheduler = FrameScheduler::new(frames.clone());

            b.iter(|| {
                for n in 0..batch {
                    drop(scheduler.enqueue(move || black_box(n)));
                }
                frames.fire();
            });
        });
    }

    group.finish();
}

/// Benchmark a view pipeline rendering a burst of growing lists
fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    for snapshots in [10, 100] {
        group.throughput(Throughput::Elements(snapshots as u64));
        group.bench_with_input(
            BenchmarkId::new("growing_list", snapshots),
            &snapshots,
            |b, &snapshots| {
                b.to_async(&runtime).iter(|| async move {
                    let fixture = PipelineFixture::new();
                    let view = fixture.environment().create_view(
                        "list",
                        render_fn(|items: &Vec<String>| list_tree(items)),
                        stream::iter((0..snapshots).map(|n| Snapshot::new(labels(n)))),
                        fixture.placeholder(),
                    );
                    black_box(drive_with_frames(view, fixture.frames()).await.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_diff, benchmark_flush, benchmark_pipeline);
criterion_main!(benches);

//! End-to-end tests of the todo demo with manually fired frames.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use fabulous_runtime::{FrameScheduler, ManualFrames, ViewEnvironment};
use fabulous_testing::helpers::drive_with_frames;
use fabulous_testing::init_test_tracing;
use fabulous_vdom::VdomBackend;
use futures::stream;
use std::sync::Arc;
use todo::{App, MemoryStore, RunReport, Stats, Todo, TodoAction, TodoStore, initial_todos};

fn app() -> (App, ManualFrames) {
    init_test_tracing();
    let frames = ManualFrames::new();
    let environment = ViewEnvironment::new(VdomBackend, FrameScheduler::new(frames.clone()));
    (App::new(environment), frames)
}

async fn run(
    app: &App,
    frames: &ManualFrames,
    actions: Vec<TodoAction>,
    initial: Vec<Todo>,
) -> RunReport {
    let store: Arc<dyn TodoStore> = Arc::new(MemoryStore::new());
    let mut reports = drive_with_frames(
        stream::once(app.run(stream::iter(actions), store, initial)),
        frames,
    )
    .await;
    assert_eq!(reports.len(), 1, "run did not complete");
    reports.pop().unwrap().unwrap()
}

fn add(description: &str) -> TodoAction {
    TodoAction::Add {
        description: description.to_string(),
    }
}

// ============================================================================
// Mounting
// ============================================================================

#[tokio::test]
async fn initial_list_mounts_without_frames() {
    let (app, frames) = app();

    let report = run(&app, &frames, Vec::new(), initial_todos(None, 3)).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.snapshots, 1);
    assert_eq!(report.last_stats, Some(Stats { complete: 0, total: 3 }));
    assert_eq!(frames.requests(), 0);

    let html = app.html();
    assert_eq!(html.matches("<li ").count(), 3);
    assert!(html.contains("<label>Todo 2</label>"));
    assert!(html.contains(r#"<input id="toggle-all" type="checkbox">"#));
    assert!(html.contains("<strong>3</strong> items left"));
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn every_view_follows_each_update() {
    let (app, frames) = app();
    let actions = vec![
        add("write docs"),
        TodoAction::CompleteAll { complete: true },
        TodoAction::Remove { position: 1 },
    ];

    let report = run(&app, &frames, actions, vec![Todo::create("buy milk")]).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.snapshots, 4);
    assert_eq!(report.last_stats, Some(Stats { complete: 1, total: 1 }));

    let html = app.html();
    assert!(!html.contains("buy milk"));
    assert!(html.contains(r#"<li class="completed""#));
    assert!(html.contains(r#"<input checked id="toggle-all" type="checkbox">"#));
    assert!(html.contains("<strong>0</strong> items left"));
    assert!(html.contains("Clear completed (1)"));
}

#[tokio::test]
async fn views_share_flushes() {
    let (app, frames) = app();

    let _report = run(&app, &frames, vec![add("a"), add("b")], Vec::new()).await;

    let stats = app.environment().scheduler().stats();
    // Three views patch once per update
    assert_eq!(stats.tasks_run, 6);
    assert!(stats.flushes <= 2, "{stats:?}");
    assert_eq!(stats.flushes, stats.frames_requested);
}

#[tokio::test]
async fn rejected_actions_render_nothing() {
    let (app, frames) = app();
    let actions = vec![add("   "), TodoAction::Toggle { position: 4 }];

    let report = run(&app, &frames, actions, vec![Todo::create("only")]).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.snapshots, 1);
    assert_eq!(frames.requests(), 0);
    assert!(app.html().contains("<label>only</label>"));
}

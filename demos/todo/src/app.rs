//! Wiring: controller → model → three views plus a counter tap.
//!
//! ```text
//!                        ┌──▶ todo list view
//! actions ──▶ model ──┬──┘
//!                     └──▶ stats ──┬──▶ toggle-all view
//!                                  ├──▶ footer view
//!                                  └──▶ counter tap
//! ```
//!
//! All views share one scheduler, so patches from one model update land in
//! the same flush. Every output is merged and drained together.

use crate::model::model;
use crate::store::TodoStore;
use crate::types::{Stats, Todo, TodoAction};
use crate::views::{render_complete_all, render_footer, render_todo_list, stats};
use fabulous_core::Snapshot;
use fabulous_core::render::render_fn;
use fabulous_runtime::{ViewEnvironment, ViewError};
use fabulous_vdom::{Document, NodeRef, VNode, VdomBackend, h};
use futures::channel::mpsc;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// What one output item of the merged views was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    List,
    ToggleAll,
    Footer,
    Counts(Stats),
}

/// Summary of a finished run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Todo list snapshots passed through the list view
    pub snapshots: usize,
    /// Counts after the last update
    pub last_stats: Option<Stats>,
    /// Failures reported by any view
    pub errors: Vec<ViewError>,
}

/// The todo application bound to one document
pub struct App {
    document: Document,
    root: NodeRef,
    environment: ViewEnvironment<VdomBackend>,
}

impl App {
    /// Build the page skeleton and bind it to `environment`.
    #[must_use]
    pub fn new(environment: ViewEnvironment<VdomBackend>) -> Self {
        let document = Document::new();
        let root = document.create(&skeleton());
        Self {
            document,
            root,
            environment,
        }
    }

    /// The live document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Views' backend and scheduler
    #[must_use]
    pub const fn environment(&self) -> &ViewEnvironment<VdomBackend> {
        &self.environment
    }

    /// HTML of the whole application
    #[must_use]
    pub fn html(&self) -> String {
        self.root.to_html()
    }

    /// Run until `actions` ends and every view has flushed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Halted`] if a view placeholder is missing from
    /// the document.
    pub async fn run<A>(
        &self,
        actions: A,
        store: Arc<dyn TodoStore>,
        initial: Vec<Todo>,
    ) -> Result<RunReport, ViewError>
    where
        A: Stream<Item = TodoAction> + Send,
    {
        let placeholder = |id: &str| {
            self.document.element_by_id(id).ok_or_else(|| {
                tracing::error!(id, "Missing placeholder");
                ViewError::Halted
            })
        };
        let list_mount = placeholder("todo-list")?;
        let toggle_mount = placeholder("toggle-all")?;
        let footer_mount = placeholder("footer")?;

        let updates = model(actions, store, initial);
        let (broadcast_updates, [list_in, stats_src]) = fan_out(updates);
        let (broadcast_stats, [toggle_in, footer_in, counts_in]) =
            fan_out(stats_src.map(stats));

        let list = self.environment.create_view(
            "todo-list",
            render_fn(render_todo_list),
            list_in,
            list_mount,
        );
        let toggle_all = self.environment.create_view(
            "toggle-all",
            render_fn(render_complete_all),
            toggle_in,
            toggle_mount,
        );
        let footer = self.environment.create_view(
            "footer",
            render_fn(render_footer),
            footer_in,
            footer_mount,
        );
        let counts = counter_tap(counts_in);

        let outputs: Vec<BoxStream<'_, Result<Tick, ViewError>>> = vec![
            list.map(|item| item.map(|_| Tick::List)).boxed(),
            toggle_all.map(|item| item.map(|_| Tick::ToggleAll)).boxed(),
            footer.map(|item| item.map(|_| Tick::Footer)).boxed(),
            counts.boxed(),
        ];
        let merged = stream::select_all(outputs);

        let ((), (), report) = futures::join!(broadcast_updates, broadcast_stats, drain(merged));
        tracing::info!(
            snapshots = report.snapshots,
            errors = report.errors.len(),
            flushes = self.environment.scheduler().stats().flushes,
            "Run finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// The static page the views mount into
fn skeleton() -> VNode {
    h("section#todoapp")
        .child(
            h("header#header").child(h("h1").text("todos")).child(
                h("form.add-todo").child(
                    h("input#new-todo")
                        .attr("name", "description")
                        .attr("placeholder", "What needs to be done?"),
                ),
            ),
        )
        .child(
            h("section#main")
                .child(h("div#toggle-all"))
                .child(h("div#todo-list")),
        )
        .child(h("div#footer"))
        .into_node()
}

/// Copy every item of `source` to `N` receivers.
///
/// The returned future does the copying and must be polled alongside the
/// receivers. Receivers dropped early are skipped.
fn fan_out<T, S, const N: usize>(
    source: S,
) -> (impl Future<Output = ()> + Send, [mpsc::UnboundedReceiver<T>; N])
where
    T: Clone + Send,
    S: Stream<Item = T> + Send,
{
    let channels: [_; N] = std::array::from_fn(|_| mpsc::unbounded::<T>());
    let senders = channels.each_ref().map(|(sender, _)| sender.clone());
    let receivers = channels.map(|(_, receiver)| receiver);

    let pump = async move {
        let mut source = std::pin::pin!(source);
        while let Some(item) = source.next().await {
            for sender in &senders {
                if sender.unbounded_send(item.clone()).is_err() {
                    tracing::trace!("Consumer gone");
                }
            }
        }
    };

    (pump, receivers)
}

/// Log the counts of every stats snapshot and pass them on.
fn counter_tap<S>(stats: S) -> impl Stream<Item = Result<Tick, ViewError>> + Send
where
    S: Stream<Item = Snapshot<Stats>> + Send,
{
    stats.map(|snapshot| {
        let stats = snapshot.into_inner();
        tracing::info!(
            todos = stats.total,
            complete = stats.complete,
            remaining = stats.remaining(),
            "Counts"
        );
        Ok(Tick::Counts(stats))
    })
}

async fn drain<S>(merged: S) -> RunReport
where
    S: Stream<Item = Result<Tick, ViewError>>,
{
    let mut merged = std::pin::pin!(merged);
    let mut report = RunReport::default();

    while let Some(item) = merged.next().await {
        match item {
            Ok(Tick::List) => report.snapshots += 1,
            Ok(Tick::Counts(stats)) => report.last_stats = Some(stats),
            Ok(Tick::ToggleAll | Tick::Footer) => {}
            Err(error) => {
                tracing::warn!(%error, "View reported a failure");
                report.errors.push(error);
            }
        }
    }

    report
}

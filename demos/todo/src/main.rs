use anyhow::Context;
use clap::Parser;
use fabulous_runtime::metrics::MetricsRecorder;
use fabulous_runtime::{RuntimeConfig, ViewEnvironment};
use fabulous_vdom::VdomBackend;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use todo::{App, JsonFileStore, MemoryStore, TodoStore, actions, initial_todos};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Drive a todo list from commands on stdin and print the rendered page.
///
/// Commands: `add <text>`, `toggle <n>`, `remove <n>`, `all`, `none`, `clear`.
#[derive(Debug, Parser)]
#[command(name = "todo", version, about)]
struct Cli {
    /// Number of generated todos when nothing has been saved yet
    #[arg(long, default_value_t = 5000)]
    seed: usize,

    /// JSON file to load todos from and save them to. Kept in memory if unset.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Log flushes slower than this many milliseconds. Defaults to one frame.
    #[arg(long)]
    slow_flush_ms: Option<u64>,

    /// Print Prometheus metrics to stderr when done
    #[arg(long, default_value_t = false)]
    metrics: bool,

    /// Skip printing the final HTML
    #[arg(long, default_value_t = false)]
    no_html: bool,
}

impl Cli {
    fn runtime_config(&self) -> RuntimeConfig {
        let frame = Duration::from_millis(self.frame_ms.max(1));
        let slow = self.slow_flush_ms.map_or(frame, Duration::from_millis);
        RuntimeConfig::new(frame, slow)
    }

    fn store(&self) -> Arc<dyn TodoStore> {
        match &self.store {
            Some(path) => Arc::new(JsonFileStore::at(path)),
            None => Arc::new(MemoryStore::new()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut recorder = MetricsRecorder::new();
    if cli.metrics {
        recorder.install().context("installing metrics recorder")?;
    }

    let store = cli.store();
    let saved = store.load().context("loading saved todos")?;
    let initial = initial_todos(saved, cli.seed);
    tracing::info!(todos = initial.len(), store = ?cli.store, "Starting");

    let environment = ViewEnvironment::from_config(VdomBackend, &cli.runtime_config());
    let app = App::new(environment);
    let commands = actions(BufReader::new(tokio::io::stdin()));

    let report = app.run(commands, store, initial).await?;

    for error in &report.errors {
        tracing::warn!(%error, "View failure during run");
    }
    if let Some(stats) = report.last_stats {
        tracing::info!(
            total = stats.total,
            remaining = stats.remaining(),
            snapshots = report.snapshots,
            "Done"
        );
    }

    if !cli.no_html {
        println!("{}", app.html());
    }
    if let Some(rendered) = recorder.render() {
        eprintln!("{rendered}");
    }

    Ok(())
}

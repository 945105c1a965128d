//! Replay recorded generator responses through a whiteboard store
//!
//! Usage: `whiteboard-replay [--config <file>] [--brainstorm] <response>...`
//!
//! Each response file is fed to the store as the answer to one prompt. The
//! final snapshot is printed as JSON, followed by an event summary and the
//! context size of each generator request on stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use whiteboard_graph::config::{WhiteboardConfig, WorkspaceMode};
use whiteboard_graph::handlers::{FragmentGenerator, GenerationOutcome, ReplayGenerator, WhiteboardSession};
use whiteboard_graph::projections::GraphSummaryProjection;
use whiteboard_graph::store::GraphStore;

struct Args {
    config: Option<PathBuf>,
    brainstorm: bool,
    responses: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        brainstorm: false,
        responses: Vec::new(),
    };
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                let path = raw.next().context("--config needs a file argument")?;
                args.config = Some(PathBuf::from(path));
            }
            "--brainstorm" => args.brainstorm = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.responses.push(PathBuf::from(path)),
        }
    }
    if args.responses.is_empty() {
        bail!("usage: whiteboard-replay [--config <file>] [--brainstorm] <response>...");
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => WhiteboardConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WhiteboardConfig::default(),
    };
    if args.brainstorm {
        config = config.with_workspace(WorkspaceMode::Brainstorm);
    }

    let generator = Arc::new(ReplayGenerator::default());
    for path in &args.responses {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading response {}", path.display()))?;
        generator.push_response(text);
    }

    let mut store = GraphStore::new(config);
    let projection = Arc::new(Mutex::new(GraphSummaryProjection::new()));
    let listener = Arc::clone(&projection);
    store.subscribe(move |recorded, snapshot| listener.lock().handle(recorded, snapshot));

    let replay: Arc<dyn FragmentGenerator> = generator.clone();
    let session = WhiteboardSession::new(store.into_shared(), replay);

    for path in &args.responses {
        let outcome = session.submit_prompt(format!("replay {}", path.display())).await;
        match &outcome {
            GenerationOutcome::Applied { merged, .. } => info!(
                file = %path.display(),
                added_nodes = merged.added_nodes.len(),
                added_edges = merged.added_edges.len(),
                "response applied"
            ),
            GenerationOutcome::Rejected { reason } | GenerationOutcome::Failed { reason } => {
                info!(file = %path.display(), %reason, "response not applied")
            }
        }
    }

    let snapshot = session.store().lock().snapshot();
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);

    let projection = projection.lock();
    let summary = projection.summary();
    eprintln!(
        "{} nodes ({} hidden), {} edges, {} messages after {} events",
        summary.node_count,
        summary.hidden_count,
        summary.edge_count,
        summary.message_count,
        projection.checkpoint().unwrap_or(0)
    );
    for (subject, count) in projection.events_by_subject() {
        eprintln!("  {subject}: {count}");
    }
    for (path, request) in args.responses.iter().zip(generator.requests()) {
        eprintln!(
            "  {} answered a request with {} context nodes",
            path.display(),
            request.context().nodes.len()
        );
    }

    Ok(())
}

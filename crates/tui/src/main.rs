mod app;
mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waterfall_core::{TimelineConfig, TraceModel};
use waterfall_protocol::Trace;

#[derive(Debug, Parser)]
#[command(name = "waterfall", about = "Browse a trace as a span waterfall", version)]
struct Args {
    /// Trace JSON with a flat, pre-order span list.
    trace: PathBuf,

    /// Timeline config JSON; fields it leaves out keep their defaults.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Write logs here. The terminal belongs to the UI, so nothing is logged
    /// without it. Filter with RUST_LOG.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TimelineConfig> {
    let Some(path) = path else {
        return Ok(TimelineConfig::default());
    };
    let data =
        std::fs::read(path).with_context(|| format!("cannot read config {}", path.display()))?;
    TimelineConfig::from_json(&data).with_context(|| format!("bad config {}", path.display()))
}

fn load_trace(path: &Path) -> Result<TraceModel> {
    let data =
        std::fs::read(path).with_context(|| format!("cannot read trace {}", path.display()))?;
    let trace: Trace = serde_json::from_slice(&data)
        .with_context(|| format!("{} is not a trace", path.display()))?;
    TraceModel::new(trace).with_context(|| format!("rejected trace {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config = load_config(args.config.as_deref())?;
    let model = load_trace(&args.trace)?;
    info!(
        trace = %args.trace.display(),
        spans = model.len(),
        duration = model.duration(),
        "trace loaded"
    );

    let app = app::App::new(model, config);
    renderer::run(app)
}

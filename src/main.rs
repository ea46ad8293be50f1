use anyhow::Context;
use clap::Parser;
use matchx::{
    ChunkedRecords, JsonLinesSource, JsonRecord, MatchConfig, MatchResponse, MatchingEngine, SearchOptions,
    DEFAULT_CHUNK_SIZE,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Match a needle record against a JSON-lines candidate file
#[derive(Parser, Debug)]
#[command(name = "matchx")]
#[command(about = "A configurable record-matching engine", long_about = None)]
struct Args {
    /// Path to the JSON match configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to a JSON file holding the needle record
    #[arg(short, long)]
    needle: PathBuf,

    /// Path to a JSON-lines file of candidate records
    #[arg(long)]
    candidates: PathBuf,

    /// Record a per-field trace on each result
    #[arg(long)]
    trace: bool,

    /// Only print the best N results
    #[arg(long)]
    top: Option<usize>,

    /// Candidates loaded per batch
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Score each batch on all cores
    #[arg(long)]
    parallel: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON response
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting matchx v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", args.config);

    let config = MatchConfig::from_path(&args.config)
        .with_context(|| format!("loading configuration from {:?}", args.config))?;

    let needle = std::fs::read_to_string(&args.needle)
        .with_context(|| format!("reading needle from {:?}", args.needle))?;
    let needle = JsonRecord::new(config.shape.clone(), serde_json::from_str(&needle)?);

    let source = JsonLinesSource::open(&args.candidates, config.shape.clone())
        .with_context(|| format!("opening candidates {:?}", args.candidates))?;
    let candidates = ChunkedRecords::new(source, args.chunk_size)?;

    let mut engine = MatchingEngine::from_config(needle, &config)?;
    let mut options = SearchOptions::new();
    if args.trace {
        options = options.traced();
    }

    let scan = if args.parallel {
        engine.search_parallel(candidates, &options, args.chunk_size)?
    } else {
        engine.try_search(candidates, &options)?
    };
    engine.order_results();

    let response = MatchResponse::from_engine(&engine, scan, args.top, |record: &JsonRecord| {
        Some(record.value().clone())
    });
    println!("{}", serde_json::to_string_pretty(&response)?);

    info!("Done: {} of {} candidates matched", scan.accepted, scan.scanned);
    Ok(())
}

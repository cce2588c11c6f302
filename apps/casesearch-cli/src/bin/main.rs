use std::env;
use std::sync::Arc;

use casesearch_core::config::{expand_path, resolve_with_base, Config, SearchSettings};
use casesearch_core::inventory::{load_records_json, scan_directory};
use casesearch_core::types::{FileRecord, SearchResult};
use casesearch_pipeline::{InMemoryRecords, QueryPipeline, SearchPhase};
use tracing_subscriber::EnvFilter;

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {} <scan|query> [source] <query> [--json]", prog);
    eprintln!("  scan  <dir> <query>           walk <dir> and search its files");
    eprintln!("  query <records.json> <query>  search an exported inventory");
    eprintln!("  source defaults to data.inventory_dir / data.records_file from config");
    std::process::exit(1)
}

struct Args {
    cmd: String,
    source: Option<String>,
    query: String,
    json: bool,
}

fn parse_args() -> Args {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    let json = args.iter().any(|a| a == "--json");
    args.retain(|a| a != "--json");
    if args.len() < 2 { usage(&prog); }
    let cmd = args.remove(0);
    let query = args.pop().unwrap_or_else(|| usage(&prog));
    let source = args.pop();
    Args { cmd, source, query, json }
}

fn load_records(config: &Config, args: &Args) -> anyhow::Result<Vec<FileRecord>> {
    // explicit arguments win; config values are relative to the working directory
    let cwd = env::current_dir()?;
    let source = |key: &str| -> anyhow::Result<std::path::PathBuf> {
        match &args.source {
            Some(s) => Ok(expand_path(s)),
            None => Ok(resolve_with_base(&cwd, config.get::<String>(key)?)),
        }
    };
    match args.cmd.as_str() {
        "scan" => scan_directory(&source("data.inventory_dir")?),
        "query" => load_records_json(&source("data.records_file")?),
        other => anyhow::bail!("Unknown command: {}", other),
    }
}

async fn run(settings: SearchSettings, records: Vec<FileRecord>, query: &str) -> anyhow::Result<casesearch_pipeline::SearchState> {
    let source = Arc::new(InMemoryRecords::new(records));
    let pipeline = QueryPipeline::new(settings, source, None);
    pipeline.set_query(query);
    if let Some(dispatch) = pipeline.flush() { dispatch.await?; }
    Ok(pipeline.state())
}

fn print_result(i: usize, r: &SearchResult) {
    println!("  {:>2}. [{}] rank={:.1}  {}", i + 1, r.match_type(), r.rank(), r.identity());
    if let Some(snippet) = r.snippet() { println!("      {}", snippet); }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.search_settings()?;
    let args = parse_args();
    let records = load_records(&config, &args)?;
    tracing::info!(records = records.len(), "inventory loaded");

    let state = tokio::runtime::Runtime::new()?.block_on(run(settings, records, &args.query))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state.results)?);
    } else {
        println!("Found {} results for \"{}\"", state.results.len(), args.query.trim());
        for (i, r) in state.results.iter().enumerate() { print_result(i, r); }
    }
    if state.phase == SearchPhase::Failed {
        if let Some(e) = state.error { anyhow::bail!(e); }
    }
    Ok(())
}

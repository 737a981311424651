// ABOUTME: Entry point for the knowledge-index builder.
// ABOUTME: Chunks knowledge documents, embeds them, and writes the index.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use techgear_support::config::AgentConfig;
use techgear_support::gemini::{GeminiClient, EMBEDDING_DIM};
use techgear_support::services::indexer::Indexer;
use techgear_support::services::vector_store::KnowledgeStore;

#[derive(Parser)]
#[command(name = "techgear-ingest")]
#[command(about = "Build the TechGear support knowledge index", long_about = None)]
#[command(version)]
struct Cli {
    /// Knowledge document or directory to ingest
    #[arg(value_name = "PATH", default_value = "data/product_info.txt")]
    docs_path: PathBuf,

    /// Clear the index before ingesting
    #[arg(long)]
    rebuild: bool,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Info);
    }
    log_builder.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = AgentConfig::from_env().context("Configuration failed")?;

    let client = Arc::new(GeminiClient::new(&config));
    let store = KnowledgeStore::create(
        &config.knowledge_db_path,
        &config.embedding_model,
        EMBEDDING_DIM,
    )
    .context("Failed to open the knowledge index")?;

    if cli.rebuild {
        log::info!("[Ingest] Rebuilding the index from scratch");
        store.clear().context("Failed to clear the knowledge index")?;
    }

    let indexer = Indexer::new(client, store.clone());
    let report = indexer
        .ingest(&cli.docs_path)
        .await
        .context("Ingest failed")?;

    let stats = store.stats().context("Failed to read index statistics")?;
    log::info!(
        "[Ingest] Index now holds {} passages from {} sources at {}",
        stats.total_passages,
        stats.total_sources,
        store.path().display()
    );

    println!(
        "Ingested {} file(s): {} skipped, {} passages written.",
        report.files_seen, report.files_skipped, report.passages_written
    );
    Ok(())
}

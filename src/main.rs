// ABOUTME: Entry point for the TechGear support agent CLI.
// ABOUTME: Answers a single query or runs an interactive support session.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use techgear_support::config::AgentConfig;
use techgear_support::gemini::{GeminiClient, EMBEDDING_DIM};
use techgear_support::orchestrator::service::SupportWorkflow;
use techgear_support::orchestrator::types::QueryResponse;
use techgear_support::services::vector_store::KnowledgeStore;

/// Longest accepted customer query, in characters.
const MAX_QUERY_CHARS: usize = 1000;

/// Shown to the customer when the workflow fails. Internal detail stays in
/// the logs.
const FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Parser)]
#[command(name = "techgear-agent")]
#[command(about = "TechGear Electronics customer support agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Customer query. Starts an interactive session when omitted.
    #[arg(value_name = "QUERY")]
    query: Vec<String>,

    /// Print the full response record as JSON
    #[arg(long)]
    json: bool,

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
    let store = KnowledgeStore::open(
        &config.knowledge_db_path,
        &config.embedding_model,
        EMBEDDING_DIM,
    )
    .context("Knowledge index unavailable (run techgear-ingest first)")?;

    let stats = store.stats().context("Knowledge index unavailable")?;
    log::info!(
        "[Agent] Knowledge index ready: {} passages from {} sources",
        stats.total_passages,
        stats.total_sources
    );

    let workflow = SupportWorkflow::new(client.clone(), client, store);

    let query = cli.query.join(" ");
    if query.is_empty() {
        run_repl(&workflow, cli.json).await
    } else {
        run_once(&workflow, &query, cli.json).await
    }
}

/// Answer one query and exit. A workflow failure exits nonzero with the
/// generic failure message; the cause is only logged.
async fn run_once(workflow: &SupportWorkflow, query: &str, json: bool) -> anyhow::Result<()> {
    let query = validate_query(query).map_err(|reason| anyhow::anyhow!(reason))?;

    match workflow.process(query).await {
        Ok(result) => print_result(&result, json),
        Err(e) => {
            log::error!("[Agent] Workflow failed: {}", e);
            Err(anyhow::anyhow!(FAILURE_MESSAGE))
        }
    }
}

/// Interactive session: one query per line until exit or end of input.
async fn run_repl(workflow: &SupportWorkflow, json: bool) -> anyhow::Result<()> {
    println!("TechGear Electronics customer support. Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let query = match validate_query(line) {
            Ok(q) => q,
            Err(reason) => {
                println!("{}", reason);
                continue;
            }
        };

        match workflow.process(query).await {
            Ok(result) => print_result(&result, json)?,
            Err(e) => {
                log::error!("[Agent] Workflow failed: {}", e);
                println!("{}", FAILURE_MESSAGE);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_result(result: &QueryResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("[{}] {}", result.category, result.response);
    }
    Ok(())
}

/// Reject queries the workflow should never see. Returns the trimmed query.
fn validate_query(raw: &str) -> Result<&str, String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err("Query is empty. Please describe how we can help.".to_string());
    }
    let length = query.chars().count();
    if length > MAX_QUERY_CHARS {
        return Err(format!(
            "Query is too long ({} characters, the limit is {}).",
            length, MAX_QUERY_CHARS
        ));
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_normal_query() {
        assert_eq!(validate_query("  store hours?  "), Ok("store hours?"));
    }

    #[test]
    fn rejects_empty_and_whitespace_queries() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   \n\t ").is_err());
    }

    #[test]
    fn rejects_queries_over_the_character_limit() {
        let too_long = "x".repeat(MAX_QUERY_CHARS + 1);
        assert!(validate_query(&too_long).is_err());

        let at_limit = "x".repeat(MAX_QUERY_CHARS);
        assert!(validate_query(&at_limit).is_ok());
    }
}

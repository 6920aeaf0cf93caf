//! Command-line interface for factcheck.
//!
//! Provides commands for verifying a claim, running the evidence search on
//! its own, serving the HTTP API, and showing the resolved configuration.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{EvidenceSource, FallbackSearch};
use crate::config;
use crate::core::Verifier;
use crate::domain::{EvidenceSet, MAX_EVIDENCE};
use crate::server;

/// factcheck - Evidence-grounded claim verification
#[derive(Parser, Debug)]
#[command(name = "factcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a claim and print the verdict as JSON
    Verify {
        /// Claim text (reads --input or stdin if not provided)
        claim: Option<String>,

        /// Read the claim from a file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Read the claim from stdin
        #[arg(long)]
        stdin: bool,

        /// Print the stage trace to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Run the evidence search for a query and print the rendered results
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to bind to (defaults to the configured address)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Show resolved configuration (credentials masked)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Verify {
                claim,
                input,
                stdin,
                trace,
            } => verify_claim(claim, input, stdin, trace).await,
            Commands::Search { query, limit } => search(&query, limit).await,
            Commands::Serve { address } => serve(address).await,
            Commands::Config => show_config(),
        }
    }
}

/// Verify a claim from the argument, a file, or stdin
async fn verify_claim(
    claim: Option<String>,
    input_file: Option<PathBuf>,
    use_stdin: bool,
    trace: bool,
) -> Result<()> {
    let claim = if let Some(claim) = claim {
        claim
    } else if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if use_stdin || !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No claim provided. Pass it as an argument, use --input <file> or pipe to stdin");
    };
    let claim = claim.trim();

    let cfg = config::config()?;
    cfg.limits
        .validate_claim(claim)
        .context("Invalid claim")?;

    let verifier = Verifier::from_config(cfg);
    let ctx = verifier.run(claim).await;

    if trace {
        for event in &ctx.trace {
            eprintln!(
                "[{:<18}] {:<9} {:>6}ms{}",
                event.stage,
                format!("{:?}", event.status).to_lowercase(),
                event.duration_ms.unwrap_or(0),
                event
                    .error
                    .as_ref()
                    .map(|e| format!("  {}", e))
                    .unwrap_or_default()
            );
        }
    }

    let verdict = ctx
        .final_response
        .context("Verification finished without a verdict")?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}

/// Run the evidence source alone
async fn search(query: &str, limit: usize) -> Result<()> {
    let cfg = config::config()?;
    let source = FallbackSearch::from_settings(&cfg.search);

    let records = source
        .search(query, limit, cfg.limits.call_timeout())
        .await
        .with_context(|| format!("Search failed for query: {}", query))?;

    let evidence = EvidenceSet::merge([records], limit.min(MAX_EVIDENCE));
    eprintln!("[{} results from {}]", evidence.len(), source.name());
    println!("{}", evidence.render());

    Ok(())
}

/// Start the HTTP server
async fn serve(address: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let address = address.unwrap_or_else(|| cfg.address.clone());
    server::serve(cfg, &address).await
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("factcheck configuration");
    println!();
    println!("{}", cfg.describe());

    Ok(())
}

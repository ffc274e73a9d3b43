//! Lab follow-up CLI, the main entry point.
//!
//! Commands:
//! - `evaluate`: run one case for a trigger observation and print the result
//! - `serve`:    start the REST gateway
//! - `ingest`:   chunk and load guideline documents into the vector store

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(
    name = "labfollowup",
    about = "Lab follow-up recommendation service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one trigger observation and print the recommendation
    Evaluate {
        /// FHIR Observation ID, bare or prefixed (e.g., "obs-creatinine-001")
        #[arg(long)]
        observation_id: String,

        /// Case ID (UUID). Generated if not provided.
        #[arg(long)]
        case_id: Option<Uuid>,
    },

    /// Start the REST gateway
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chunk and load guideline documents into the vector store
    Ingest {
        /// Directory of .txt/.md/.markdown guideline documents
        #[arg(long)]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Evaluate {
            observation_id,
            case_id,
        } => commands::evaluate::run(observation_id, case_id).await?,
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Ingest { dir } => commands::ingest::run(dir).await?,
    }

    Ok(())
}

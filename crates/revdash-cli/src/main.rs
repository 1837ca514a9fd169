mod dataset;
mod reviews;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revdash_sentiment::ReviewService;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revdash-cli")]
#[command(about = "Review sentiment dashboard command line interface")]
struct Cli {
    /// Number of source records to load (defaults to REVDASH_INITIAL_LOAD)
    #[arg(long, global = true)]
    count: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load reviews and print corpus statistics as JSON
    Stats,
    /// Load reviews and print monthly sentiment trends as JSON
    Trends,
    /// Score a single piece of text
    Analyze {
        text: String,
    },
    /// Search review comments
    Search {
        query: String,
        /// Maximum number of results
        #[arg(long, default_value = "10")]
        top_k: usize,
        /// Rank by embedding similarity instead of substring match
        #[arg(long)]
        semantic: bool,
    },
    /// Load reviews and build (or refresh) the embedding cache
    BuildEmbeddings,
    /// Copy the header and first rows of a review CSV into a smaller file
    Sample {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "3000")]
        rows: usize,
    },
    /// Print the column names and first rows of a review CSV
    Inspect {
        #[arg(long, env = "REVDASH_DATA_PATH", default_value = "./reviews.csv")]
        input: PathBuf,
        #[arg(long, default_value = "5")]
        rows: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Stats) => {
            let (service, count) = open_service(cli.count)?;
            reviews::run_stats(&service, count).await
        }
        Some(Commands::Trends) => {
            let (service, count) = open_service(cli.count)?;
            reviews::run_trends(&service, count).await
        }
        Some(Commands::Analyze { text }) => {
            let (service, _) = open_service(cli.count)?;
            reviews::run_analyze(&service, &text)
        }
        Some(Commands::Search {
            query,
            top_k,
            semantic,
        }) => {
            let (service, count) = open_service(cli.count)?;
            reviews::run_search(&service, count, &query, top_k, semantic).await
        }
        Some(Commands::BuildEmbeddings) => {
            let (service, count) = open_service(cli.count)?;
            reviews::run_build_embeddings(&service, count).await
        }
        Some(Commands::Sample {
            input,
            output,
            rows,
        }) => dataset::run_sample(&input, &output, rows),
        Some(Commands::Inspect { input, rows }) => dataset::run_inspect(&input, rows),
        None => {
            println!("revdash-cli ready; run with --help for commands");
            Ok(())
        }
    }
}

/// Build the review service from the environment. Returns it with the load
/// size: `--count` if given, else the configured initial load.
fn open_service(count: Option<usize>) -> anyhow::Result<(ReviewService, usize)> {
    let config = revdash_core::load_app_config()?;
    let count = count.unwrap_or(config.initial_load_count);
    Ok((ReviewService::from_config(&config)?, count))
}

#[cfg(test)]
mod tests;

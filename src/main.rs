use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docs_bake::Result;
use docs_bake::commands::{bake, discover};
use docs_bake::config::BakeConfig;

#[derive(Parser)]
#[command(name = "docs-bake")]
#[command(about = "Bake versioned Quarkus documentation into a pgvector retrieval corpus")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, ingest and snapshot the guides for a version
    Bake {
        /// Target Quarkus version (e.g. 3.30.6)
        #[arg(long)]
        quarkus_version: Option<String>,
        /// Splitter chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Overlap between consecutive chunks in characters
        #[arg(long)]
        chunk_overlap: Option<usize>,
        /// Split at Markdown headings instead of fixed-size windows
        #[arg(long)]
        semantic: bool,
        /// Maximum number of guides to process (0 = all, useful for testing)
        #[arg(long)]
        max_guides: Option<usize>,
        /// Local checkout of the documentation sources
        #[arg(long)]
        sources_dir: Option<PathBuf>,
        /// Directory the snapshot artifact is staged into
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List the guides discovered on the index page
    Discover,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(BakeConfig::default_path)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = BakeConfig::load(&config_path)?;

    match cli.command {
        Commands::Bake {
            quarkus_version,
            chunk_size,
            chunk_overlap,
            semantic,
            max_guides,
            sources_dir,
            output_dir,
        } => {
            if let Some(version) = quarkus_version {
                config.quarkus_version = version;
            }
            if let Some(size) = chunk_size {
                config.chunk_size = size;
            }
            if let Some(overlap) = chunk_overlap {
                config.chunk_overlap = overlap;
            }
            if semantic {
                config.semantic_chunking = true;
            }
            if let Some(max) = max_guides {
                config.max_guides = max;
            }
            if let Some(dir) = sources_dir {
                config.sources_dir = Some(dir);
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            bake(config).await?;
        }
        Commands::Discover => {
            discover(config).await?;
        }
    }

    Ok(())
}

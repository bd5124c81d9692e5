//! mampfsearch CLI entry point.

use anyhow::Result;
use clap::Parser;
use mampfsearch::cli::commands::{self, IngestOptions};
use mampfsearch::cli::{Cli, Commands};
use mampfsearch::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("mampfsearch={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Chunk {
            file,
            min,
            max,
            no_overlap,
            output,
            format,
        } => {
            commands::run_chunk(file, *min, *max, *no_overlap, output.as_deref(), format, &settings)?;
        }

        Commands::Ingest {
            file,
            course,
            lecture,
            collection,
            min,
            max,
            no_overlap,
        } => {
            let options = IngestOptions {
                course,
                lecture: lecture.as_deref(),
                collection: collection.as_deref(),
                min: *min,
                max: *max,
                no_overlap: *no_overlap,
            };
            commands::run_ingest(file, options, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            retriever,
            rerank,
            collection,
        } => {
            commands::run_search(
                query,
                *limit,
                retriever.as_deref(),
                *rerank,
                collection.as_deref(),
                settings,
            )
            .await?;
        }

        Commands::Ask {
            question,
            retriever,
            limit,
            collection,
        } => {
            commands::run_ask(question, retriever.as_deref(), *limit, collection.as_deref(), settings).await?;
        }

        Commands::Benchmark {
            datasets,
            retrievers,
            no_rerank,
            output,
        } => {
            commands::run_benchmark(datasets, retrievers, *no_rerank, output.as_deref(), settings).await?;
        }

        Commands::Collections { action } => {
            commands::run_collections(action, &settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}

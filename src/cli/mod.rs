//! CLI module for mampfsearch.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// mampfsearch - search and question answering over lecture recordings
///
/// Chunks lecture subtitles, indexes them with dense, sparse and multi-vector
/// embeddings, and benchmarks retrieval strategies against labelled questions.
#[derive(Parser, Debug)]
#[command(name = "mampfsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MAMPFSEARCH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config and create the default collection
    Init,

    /// Check configuration and service reachability
    Doctor,

    /// Chunk a subtitle file without indexing it
    Chunk {
        /// SRT or WebVTT file
        file: String,

        /// Minimum chunk size in characters
        #[arg(long)]
        min: Option<usize>,

        /// Maximum chunk size in characters
        #[arg(long)]
        max: Option<usize>,

        /// Do not pad chunks with their neighbours
        #[arg(long)]
        no_overlap: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (json, srt, vtt)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Chunk, embed and index a subtitle or plain-text file
    Ingest {
        /// SRT, WebVTT or .txt file
        file: String,

        /// Course identifier stored with every chunk
        #[arg(long)]
        course: String,

        /// Lecture identifier (defaults to the file stem)
        #[arg(long)]
        lecture: Option<String>,

        /// Target collection
        #[arg(long)]
        collection: Option<String>,

        /// Minimum chunk size in characters
        #[arg(long)]
        min: Option<usize>,

        /// Maximum chunk size in characters
        #[arg(long)]
        max: Option<usize>,

        /// Do not pad chunks with their neighbours
        #[arg(long)]
        no_overlap: bool,
    },

    /// Search a collection
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Retriever (dense, hybrid, hybrid+colbert)
        #[arg(short, long)]
        retriever: Option<String>,

        /// Rerank candidates with the cross-encoder
        #[arg(long)]
        rerank: bool,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,
    },

    /// Ask a question and get an answer from the lectures
    Ask {
        /// The question to ask
        question: String,

        /// Retriever (dense, hybrid, hybrid+colbert)
        #[arg(short, long)]
        retriever: Option<String>,

        /// Maximum number of passages given to the LLM
        #[arg(short, long)]
        limit: Option<usize>,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,
    },

    /// Run retrieval benchmarks and write a CSV report
    Benchmark {
        /// Dataset JSON files (defaults to [benchmark].datasets)
        datasets: Vec<String>,

        /// Retrievers to evaluate, comma separated
        #[arg(short, long, value_delimiter = ',')]
        retrievers: Vec<String>,

        /// Skip the reranked runs
        #[arg(long)]
        no_rerank: bool,

        /// Directory for the CSV report
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CollectionsAction {
    /// List collections
    List,

    /// Show point count and dimensions of a collection
    Info {
        name: String,
    },

    /// Delete a collection and its points
    Delete {
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from(["mampfsearch", "-vv", "search", "eigenvalues", "--rerank", "-l", "3"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, limit, rerank, .. } => {
                assert_eq!(query, "eigenvalues");
                assert_eq!(limit, Some(3));
                assert!(rerank);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_benchmark_retrievers() {
        let cli = Cli::parse_from(["mampfsearch", "benchmark", "a.json", "b.json", "-r", "dense,hybrid"]);
        match cli.command {
            Commands::Benchmark { datasets, retrievers, no_rerank, .. } => {
                assert_eq!(datasets, vec!["a.json", "b.json"]);
                assert_eq!(retrievers, vec!["dense", "hybrid"]);
                assert!(!no_rerank);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

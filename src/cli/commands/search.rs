//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use crate::retrieval::RetrieverKind;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: Option<usize>,
    retriever: Option<&str>,
    rerank: bool,
    collection: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let kind = parse_kind(retriever, &settings)?;
    let reranking = rerank || settings.retrieval.reranking;
    let limit = limit.unwrap_or(settings.retrieval.limit);
    let collection = collection
        .map(str::to_string)
        .unwrap_or_else(|| settings.vector_store.collection.clone());

    if let Err(e) = preflight::check(Operation::Search { reranking }, &settings).await {
        Output::error(&e.to_string());
        Output::info("Run 'mampfsearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let retriever = pipeline.retriever(kind, reranking);

    let spinner = Output::spinner("Searching...");
    let results = retriever.retrieve(query, &collection, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(items) => {
            if items.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results ({})", items.len(), kind));
                for (i, item) in items.iter().enumerate() {
                    Output::search_result(i + 1, item);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Retriever kind from a flag, falling back to `[retrieval].retriever`.
pub(crate) fn parse_kind(requested: Option<&str>, settings: &Settings) -> Result<RetrieverKind> {
    requested
        .unwrap_or(&settings.retrieval.retriever)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
}

//! Ask command implementation.

use super::search::parse_kind;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use console::style;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    retriever: Option<&str>,
    limit: Option<usize>,
    collection: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let kind = parse_kind(retriever, &settings)?;
    let reranking = settings.retrieval.reranking;
    let limit = limit.unwrap_or(settings.retrieval.limit);
    let collection = collection
        .map(str::to_string)
        .unwrap_or_else(|| settings.vector_store.collection.clone());

    if let Err(e) = preflight::check(Operation::Ask { reranking }, &settings).await {
        Output::error(&e.to_string());
        Output::info("Run 'mampfsearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let engine = pipeline.answer_engine(pipeline.retriever(kind, reranking));

    let spinner = Output::spinner("Searching lectures...");
    let result = engine.ask(question, &collection, limit).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer.answer);
            Output::kv("Confidence", &format!("{:.2}", answer.confidence_score));

            if !answer.source_snippets.is_empty() {
                Output::header("Sources");
                let mut snippets: Vec<_> = answer.source_snippets.iter().collect();
                snippets.sort_by(|a, b| b.1.total_cmp(a.1));
                for (snippet, relevance) in snippets {
                    Output::list_item(&format!("{} {}", style(format!("({:.2})", relevance)).dim(), snippet));
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

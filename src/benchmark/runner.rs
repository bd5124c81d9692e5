//! Runs an evaluation dataset against a retriever.

use super::dataset::EvaluationDataset;
use super::ndcg::{ndcg, ranked_positions};
use crate::chunking::{chunk_cues, verbatim_chunks, ChunkingConfig};
use crate::config::IdealOrder;
use crate::error::Result;
use crate::orchestrator::{CollectionStatus, Pipeline};
use crate::retrieval::Retriever;
use crate::subtitle::read_subtitle_file;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Aggregate outcome of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub average_score: f64,
    pub duration_seconds: f64,
    pub time_per_question: f64,
    /// Per-question NDCG in dataset order.
    #[serde(skip)]
    pub question_scores: Vec<f64>,
}

/// Evaluates one retriever on one dataset.
pub struct Benchmark<'a> {
    dataset: &'a EvaluationDataset,
    retriever: Arc<dyn Retriever>,
    ideal_order: IdealOrder,
}

impl<'a> Benchmark<'a> {
    pub fn new(dataset: &'a EvaluationDataset, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            dataset,
            retriever,
            ideal_order: IdealOrder::default(),
        }
    }

    pub fn with_ideal_order(mut self, order: IdealOrder) -> Self {
        self.ideal_order = order;
        self
    }

    /// Prepare the dataset's scratch collection, then evaluate against it.
    pub async fn run(&self, pipeline: &Pipeline, chunking: &ChunkingConfig, verbatim: bool) -> Result<BenchmarkResult> {
        let status = prepare_collection(pipeline, self.dataset, chunking, verbatim).await?;
        self.evaluate(&status.name).await
    }

    /// Score every question against an already populated collection.
    #[instrument(skip(self), fields(dataset = %self.dataset.name, retriever = self.retriever.name()))]
    pub async fn evaluate(&self, collection: &str) -> Result<BenchmarkResult> {
        let start = Instant::now();
        let mut scores = Vec::with_capacity(self.dataset.len());

        for question in &self.dataset.questions {
            let judgments = &question.relevant_documents;
            if judgments.is_empty() {
                info!(question = %question.question, "No relevance judgments, scoring 0");
                scores.push(0.0);
                continue;
            }

            let items = self
                .retriever
                .retrieve(&question.question, collection, judgments.len())
                .await?;
            let ranked = ranked_positions(&items);
            let positions: Vec<Option<u32>> = ranked.iter().map(|(p, _)| *p).collect();
            let score = ndcg(judgments, &positions, self.ideal_order);

            info!(
                question = %question.question,
                score,
                relevant = %judgments,
                retrieved = %format_ranked(&ranked),
                "Evaluated question"
            );
            scores.push(score);
        }

        let duration_seconds = start.elapsed().as_secs_f64();
        let count = scores.len();
        let (average_score, time_per_question) = if count == 0 {
            (0.0, 0.0)
        } else {
            (scores.iter().sum::<f64>() / count as f64, duration_seconds / count as f64)
        };

        info!(
            average_score,
            duration_seconds,
            questions = count,
            "Benchmark finished"
        );

        Ok(BenchmarkResult {
            average_score,
            duration_seconds,
            time_per_question,
            question_scores: scores,
        })
    }
}

/// Create and populate the dataset's scratch collection unless it exists.
///
/// A collection whose ingestion fails is removed again so the next run retries.
pub async fn prepare_collection(
    pipeline: &Pipeline,
    dataset: &EvaluationDataset,
    chunking: &ChunkingConfig,
    verbatim: bool,
) -> Result<CollectionStatus> {
    let status = pipeline.ensure_collection(&dataset.collection_name()).await?;
    if !status.created {
        info!(collection = %status.name, "Benchmark collection exists, skipping ingestion");
        return Ok(status);
    }

    let populated: Result<usize> = async {
        let cues = read_subtitle_file(&dataset.srt_path)?;
        let chunks = if verbatim {
            verbatim_chunks(&cues, &dataset.name, &dataset.lecture_name)
        } else {
            chunk_cues(&cues, &dataset.name, &dataset.lecture_name, chunking)?
        };
        pipeline.ingest_chunks(&status.name, chunks).await
    }
    .await;

    match populated {
        Ok(inserted) => {
            info!(collection = %status.name, inserted, "Populated benchmark collection");
            Ok(status)
        }
        Err(e) => {
            if let Err(cleanup) = pipeline.index().delete_collection(&status.name).await {
                warn!(collection = %status.name, error = %cleanup, "Failed to remove partial collection");
            }
            Err(e)
        }
    }
}

fn format_ranked(ranked: &[(Option<u32>, f32)]) -> String {
    let entries: Vec<String> = ranked
        .iter()
        .map(|(position, score)| match position {
            Some(p) => format!("{}: {:.4}", p, score),
            None => format!("-: {:.4}", score),
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

//! Cross-product benchmark driver: datasets × retrievers × rerankers.

use super::dataset::EvaluationDataset;
use super::runner::{prepare_collection, Benchmark, BenchmarkResult};
use crate::chunking::ChunkingConfig;
use crate::config::IdealOrder;
use crate::error::Result;
use crate::orchestrator::Pipeline;
use crate::reranker::CrossEncoder;
use crate::retrieval::{Retriever, RetrieverKind, RerankerRetriever};
use std::sync::Arc;
use tracing::info;

/// Reranker column value for undecorated runs.
pub const NO_RERANKER: &str = "None";

/// One row of a suite report.
#[derive(Debug, Clone)]
pub struct SuiteRow {
    pub dataset: String,
    pub retriever: String,
    pub reranker: String,
    pub result: BenchmarkResult,
}

/// Runs every retriever, bare and under each reranker, on each dataset.
pub struct BenchmarkSuite<'a> {
    pipeline: &'a Pipeline,
    retrievers: Vec<RetrieverKind>,
    rerankers: Vec<(String, Arc<dyn CrossEncoder>)>,
    chunking: ChunkingConfig,
    ideal_order: IdealOrder,
    verbatim_cues: bool,
}

impl<'a> BenchmarkSuite<'a> {
    pub fn new(pipeline: &'a Pipeline, retrievers: Vec<RetrieverKind>, chunking: ChunkingConfig) -> Self {
        Self {
            pipeline,
            retrievers,
            rerankers: Vec::new(),
            chunking,
            ideal_order: IdealOrder::default(),
            verbatim_cues: false,
        }
    }

    /// Add a named reranker; each retriever is also run decorated with it.
    pub fn with_reranker(mut self, name: impl Into<String>, cross_encoder: Arc<dyn CrossEncoder>) -> Self {
        self.rerankers.push((name.into(), cross_encoder));
        self
    }

    pub fn with_ideal_order(mut self, order: IdealOrder) -> Self {
        self.ideal_order = order;
        self
    }

    pub fn with_verbatim_cues(mut self, verbatim: bool) -> Self {
        self.verbatim_cues = verbatim;
        self
    }

    /// Number of runs per dataset.
    pub fn runs_per_dataset(&self) -> usize {
        self.retrievers.len() * (self.rerankers.len() + 1)
    }

    pub async fn run(&self, datasets: &[EvaluationDataset]) -> Result<Vec<SuiteRow>> {
        let mut rows = Vec::new();
        for dataset in datasets {
            rows.extend(self.run_dataset(dataset).await?);
        }
        Ok(rows)
    }

    /// All runs for a single dataset, in retriever then reranker order.
    pub async fn run_dataset(&self, dataset: &EvaluationDataset) -> Result<Vec<SuiteRow>> {
        let status = prepare_collection(self.pipeline, dataset, &self.chunking, self.verbatim_cues).await?;
        let prefetch_limit = self.pipeline.settings().retrieval.prefetch_limit;
        let mut rows = Vec::with_capacity(self.runs_per_dataset());

        for kind in &self.retrievers {
            let base = self.pipeline.base_retriever(*kind);
            let retriever_name = base.name().to_string();

            let mut variants: Vec<(String, Arc<dyn Retriever>)> = vec![(NO_RERANKER.to_string(), base.clone())];
            for (name, cross_encoder) in &self.rerankers {
                let decorated = RerankerRetriever::new(base.clone(), cross_encoder.clone(), prefetch_limit);
                variants.push((name.clone(), Arc::new(decorated)));
            }

            for (reranker, retriever) in variants {
                info!(dataset = %dataset.name, retriever = %retriever_name, reranker = %reranker, "Running benchmark");
                let result = Benchmark::new(dataset, retriever)
                    .with_ideal_order(self.ideal_order)
                    .evaluate(&status.name)
                    .await?;
                rows.push(SuiteRow {
                    dataset: dataset.name.clone(),
                    retriever: retriever_name.clone(),
                    reranker,
                    result,
                });
            }
        }

        Ok(rows)
    }
}

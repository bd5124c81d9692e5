//! Retrieval quality benchmarks.
//!
//! An [`EvaluationDataset`] pairs a lecture's subtitle file with questions and
//! graded relevance judgments. [`Benchmark`] scores one retriever by mean NDCG,
//! [`BenchmarkSuite`] runs the retriever × reranker grid and
//! [`report::write_csv`] exports the result table.

mod dataset;
mod ndcg;
pub mod report;
mod runner;
mod suite;

pub use dataset::{EvaluationDataset, Question, RelevanceJudgments};
pub use ndcg::{dcg, ideal_dcg, ndcg, ranked_positions};
pub use runner::{prepare_collection, Benchmark, BenchmarkResult};
pub use suite::{BenchmarkSuite, SuiteRow, NO_RERANKER};

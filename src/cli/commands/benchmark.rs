//! Benchmark command - evaluate retrievers and rerankers on labelled datasets.

use crate::benchmark::{report, BenchmarkSuite, EvaluationDataset};
use crate::chunking::ChunkingConfig;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use crate::reranker::HttpCrossEncoder;
use crate::retrieval::RetrieverKind;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Run the benchmark command.
pub async fn run_benchmark(
    datasets: &[String],
    retrievers: &[String],
    no_rerank: bool,
    output: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let dataset_paths: &[String] = if datasets.is_empty() {
        &settings.benchmark.datasets
    } else {
        datasets
    };
    if dataset_paths.is_empty() {
        anyhow::bail!("No datasets given. Pass dataset files or set [benchmark] datasets.");
    }

    let mut loaded = Vec::with_capacity(dataset_paths.len());
    for path in dataset_paths {
        let path = Settings::expand_path(path);
        let dataset = EvaluationDataset::load(&path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        loaded.push(dataset);
    }

    let retriever_names: &[String] = if retrievers.is_empty() {
        &settings.benchmark.retrievers
    } else {
        retrievers
    };
    let kinds = retriever_names
        .iter()
        .map(|name| name.parse::<RetrieverKind>().map_err(|e| anyhow::anyhow!(e)))
        .collect::<Result<Vec<_>>>()?;

    let reranking = !no_rerank && !settings.benchmark.rerankers.is_empty();
    if let Err(e) = preflight::check(Operation::Benchmark { reranking }, &settings).await {
        Output::error(&e.to_string());
        Output::info("Run 'mampfsearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let results_dir = output
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.results_dir());
    let cross_encoder = HttpCrossEncoder::from_settings(&settings.reranker)?;
    let pipeline = Pipeline::new(settings.clone())?;

    let mut suite = BenchmarkSuite::new(&pipeline, kinds, ChunkingConfig::from(&settings.chunking))
        .with_ideal_order(settings.benchmark.ideal_order)
        .with_verbatim_cues(settings.benchmark.verbatim_cues);
    if reranking {
        for profile in &settings.benchmark.rerankers {
            suite = suite.with_reranker(&profile.name, Arc::new(cross_encoder.with_model(&profile.model)));
        }
    }

    Output::header("Benchmark");
    Output::kv("Datasets", &loaded.len().to_string());
    Output::kv("Runs per dataset", &suite.runs_per_dataset().to_string());

    let progress = Output::progress_bar(loaded.len() as u64, "datasets");
    let mut rows = Vec::new();
    for dataset in &loaded {
        progress.set_message(dataset.name.clone());
        let dataset_rows = suite
            .run_dataset(dataset)
            .await
            .with_context(|| format!("Benchmark of {} failed", dataset.name))?;
        progress.suspend(|| {
            Output::header(&format!("{} ({} questions)", dataset.name, dataset.len()));
            for row in &dataset_rows {
                Output::benchmark_row(row);
            }
        });
        rows.extend(dataset_rows);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let path = report::write_csv(&rows, &results_dir)?;
    println!();
    Output::success(&format!("Results written to {}", path.display()));

    Ok(())
}

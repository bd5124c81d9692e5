//! Ingest command implementation.

use super::chunk::{chunking_config, lecture_id_for};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use anyhow::Result;
use std::path::Path;

/// Options for the ingest command.
pub struct IngestOptions<'a> {
    pub course: &'a str,
    pub lecture: Option<&'a str>,
    pub collection: Option<&'a str>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub no_overlap: bool,
}

/// Run the ingest command.
pub async fn run_ingest(file: &str, options: IngestOptions<'_>, settings: Settings) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }

    if let Err(e) = preflight::check(Operation::Ingest, &settings).await {
        Output::error(&e.to_string());
        Output::info("Run 'mampfsearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let collection = options
        .collection
        .map(str::to_string)
        .unwrap_or_else(|| settings.vector_store.collection.clone());
    let config = chunking_config(&settings, options.min, options.max, options.no_overlap);
    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", file));
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    let result = if is_text {
        pipeline.ingest_text_file(path, options.course, &collection).await
    } else {
        let lecture = options
            .lecture
            .map(str::to_string)
            .unwrap_or_else(|| lecture_id_for(path));
        pipeline
            .ingest_subtitles(path, options.course, &lecture, &collection, &config)
            .await
    };
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Indexed {} chunks into {}",
                result.inserted, result.collection
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}

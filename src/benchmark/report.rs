//! CSV export of suite results.

use super::suite::SuiteRow;
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "dataset,retriever,reranker,average_score,duration_seconds,time_per_question";

/// Render rows as CSV, header first.
pub fn to_csv(rows: &[SuiteRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&row.dataset),
            csv_field(&row.retriever),
            csv_field(&row.reranker),
            row.result.average_score,
            row.result.duration_seconds,
            row.result.time_per_question,
        ));
    }
    out
}

/// Write `benchmark_results_<timestamp>.csv` into `dir`, creating it if needed.
pub fn write_csv(rows: &[SuiteRow], dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("benchmark_results_{}.csv", timestamp));
    std::fs::write(&path, to_csv(rows))?;
    Ok(path)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

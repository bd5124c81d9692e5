//! Chunk command - preview how a subtitle file is split.

use crate::chunking::{chunk_subtitle_file, Chunk, ChunkingConfig, Location};
use crate::cli::Output;
use crate::config::Settings;
use crate::subtitle::{format_srt, format_vtt, Cue, OutputFormat};
use anyhow::Result;
use std::path::Path;

/// Run the chunk command.
pub fn run_chunk(
    file: &str,
    min: Option<usize>,
    max: Option<usize>,
    no_overlap: bool,
    output: Option<&str>,
    format: &str,
    settings: &Settings,
) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let config = chunking_config(settings, min, max, no_overlap);

    let path = Path::new(file);
    let lecture_id = lecture_id_for(path);
    let chunks = chunk_subtitle_file(path, "", &lecture_id, &config, None)?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&chunks)?,
        OutputFormat::Srt => format_srt(&chunks_to_cues(&chunks)),
        OutputFormat::Vtt => format_vtt(&chunks_to_cues(&chunks)),
    };

    match output {
        Some(out) => {
            std::fs::write(out, content)?;
            Output::success(&format!("Wrote {} chunks to {}", chunks.len(), out));
        }
        None => println!("{}", content),
    }

    Ok(())
}

/// Chunking bounds from the settings, overridden by command-line flags.
pub(crate) fn chunking_config(settings: &Settings, min: Option<usize>, max: Option<usize>, no_overlap: bool) -> ChunkingConfig {
    let defaults = ChunkingConfig::from(&settings.chunking);
    ChunkingConfig::new(
        min.unwrap_or(defaults.min_chunk_size),
        max.unwrap_or(defaults.max_chunk_size),
        defaults.overlap && !no_overlap,
    )
}

pub(crate) fn lecture_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("lecture")
        .to_string()
}

fn chunks_to_cues(chunks: &[Chunk]) -> Vec<Cue> {
    chunks
        .iter()
        .enumerate()
        .filter_map(|(i, chunk)| match &chunk.location {
            Location::Video {
                start_seconds,
                end_seconds,
                ..
            } => Some(Cue::new(i as u32 + 1, *start_seconds, *end_seconds, chunk.text.clone())),
            Location::File { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings::default();
        let config = chunking_config(&settings, Some(10), None, true);
        assert_eq!(config, ChunkingConfig::new(10, settings.chunking.max_chunk_size, false));

        let config = chunking_config(&settings, None, None, false);
        assert_eq!(config, ChunkingConfig::from(&settings.chunking));
    }

    #[test]
    fn test_chunks_to_cues() {
        let chunk = Chunk {
            text: "Hello world.".to_string(),
            location: Location::Video {
                course_id: String::new(),
                lecture_id: "l01".to_string(),
                start_seconds: 1.0,
                end_seconds: 2.5,
            },
            position: Some(0),
        };
        let cues = chunks_to_cues(&[chunk]);
        assert_eq!(cues, vec![Cue::new(1, 1.0, 2.5, "Hello world.")]);
    }
}

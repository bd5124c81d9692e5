//! Chunking of lecture sources into searchable passages.
//!
//! Subtitles go through a four-pass segmentation (sentence split, sentence
//! completion, minimum-size growth with optional overlap, maximum-size split).
//! Plain text is grouped into fixed runs of sentences.

mod segment;
mod text;

pub use segment::{
    merge_until_min_size, merge_until_sentence_complete, segment_cues, split_at_sentences,
    split_at_word_boundary,
};
pub use text::{chunk_text, chunk_text_file, split_sentences};

use crate::config::ChunkingSettings;
use crate::error::{MampfError, Result};
use crate::subtitle::{self, Cue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// A time span in a recorded lecture.
    Video {
        course_id: String,
        lecture_id: String,
        start_seconds: f64,
        end_seconds: f64,
    },
    /// A plain-text document.
    File { course_id: String, file_id: String },
}

impl Location {
    pub fn course_id(&self) -> &str {
        match self {
            Location::Video { course_id, .. } | Location::File { course_id, .. } => course_id,
        }
    }

    /// Human-readable source label for display.
    pub fn describe(&self) -> String {
        match self {
            Location::Video {
                course_id,
                lecture_id,
                start_seconds,
                end_seconds,
            } => format!(
                "{}/{} [{} - {}]",
                course_id,
                lecture_id,
                subtitle::format_timestamp(*start_seconds),
                subtitle::format_timestamp(*end_seconds)
            ),
            Location::File { course_id, file_id } => format!("{}/{}", course_id, file_id),
        }
    }
}

/// A retrieval-unit passage of text with location metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub location: Location,
    /// Ordinal within the source; used as the document id in relevance judgments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Size bounds for subtitle chunking, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub overlap: bool,
}

impl ChunkingConfig {
    pub fn new(min_chunk_size: usize, max_chunk_size: usize, overlap: bool) -> Self {
        Self {
            min_chunk_size,
            max_chunk_size,
            overlap,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size < self.min_chunk_size {
            return Err(MampfError::InvalidConfiguration(format!(
                "max_chunk_size ({}) must be >= min_chunk_size ({})",
                self.max_chunk_size, self.min_chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(&ChunkingSettings::default())
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self::new(settings.min_chunk_size, settings.max_chunk_size, settings.overlap)
    }
}

/// Chunk parsed subtitle cues into passages with video locations.
///
/// Fails with `InvalidConfiguration` before any work if the size bounds are
/// inverted. Passages that are empty after trimming are dropped; the rest are
/// numbered from 1, the same numbering `format_srt` writes.
pub fn chunk_cues(
    cues: &[Cue],
    course_id: &str,
    lecture_id: &str,
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>> {
    let blocks = segment_cues(cues, config)?;
    Ok(blocks_to_chunks(&blocks, course_id, lecture_id))
}

/// Read, parse and chunk a subtitle file.
///
/// If `debug_output` is given, the final blocks are also written there as SRT.
pub fn chunk_subtitle_file(
    path: &Path,
    course_id: &str,
    lecture_id: &str,
    config: &ChunkingConfig,
    debug_output: Option<&Path>,
) -> Result<Vec<Chunk>> {
    config.validate()?;
    info!("Chunking subtitle file: {}", path.display());

    let cues = subtitle::read_subtitle_file(path)?;
    debug!("Loaded {} raw cues", cues.len());

    let blocks: Vec<Cue> = segment_cues(&cues, config)?
        .into_iter()
        .filter(|block| !block.content.trim().is_empty())
        .collect();
    if let Some(output) = debug_output {
        std::fs::write(output, subtitle::format_srt(&blocks))?;
        debug!("Debug SRT saved to: {}", output.display());
    }

    let chunks = blocks_to_chunks(&blocks, course_id, lecture_id);
    info!("Final chunk count: {}", chunks.len());
    Ok(chunks)
}

/// One chunk per cue, keeping the cue number as position.
///
/// For sources that were chunked ahead of time and whose relevance judgments
/// reference cue numbers.
pub fn verbatim_chunks(cues: &[Cue], course_id: &str, lecture_id: &str) -> Vec<Chunk> {
    cues.iter()
        .filter(|cue| !cue.content.trim().is_empty())
        .map(|cue| Chunk {
            text: cue.content.trim().to_string(),
            location: Location::Video {
                course_id: course_id.to_string(),
                lecture_id: lecture_id.to_string(),
                start_seconds: cue.start_seconds,
                end_seconds: cue.end_seconds,
            },
            position: Some(cue.index),
        })
        .collect()
}

fn blocks_to_chunks(blocks: &[Cue], course_id: &str, lecture_id: &str) -> Vec<Chunk> {
    blocks
        .iter()
        .map(|block| (block.content.trim(), block))
        .filter(|(text, _)| !text.is_empty())
        .zip(1u32..)
        .map(|((text, block), position)| Chunk {
            text: text.to_string(),
            location: Location::Video {
                course_id: course_id.to_string(),
                lecture_id: lecture_id.to_string(),
                start_seconds: block.start_seconds,
                end_seconds: block.end_seconds,
            },
            position: Some(position),
        })
        .collect()
}

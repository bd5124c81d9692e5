//! Subtitle cues and the SRT/WebVTT formats they are read from.

mod format;
mod parse;

pub use format::{format_srt, format_vtt, OutputFormat};
pub use parse::{parse_srt, parse_vtt};

use crate::error::{MampfError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single timestamped subtitle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Sequence number from the source file (1-based).
    pub index: u32,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Text content; may be empty or end mid-sentence.
    pub content: String,
}

impl Cue {
    pub fn new(index: u32, start_seconds: f64, end_seconds: f64, content: impl Into<String>) -> Self {
        Self {
            index,
            start_seconds,
            end_seconds,
            content: content.into(),
        }
    }

    /// Duration of this cue in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Length of the content in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Subtitle formats accepted as chunker input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("srt") => Ok(SubtitleFormat::Srt),
            Some("vtt") => Ok(SubtitleFormat::Vtt),
            _ => Err(MampfError::InvalidFormat(format!(
                "{} is not a recognized subtitle file (expected .srt or .vtt)",
                path.display()
            ))),
        }
    }

    /// Parse subtitle text in this format.
    pub fn parse(&self, text: &str) -> Result<Vec<Cue>> {
        match self {
            SubtitleFormat::Srt => parse_srt(text),
            SubtitleFormat::Vtt => parse_vtt(text),
        }
    }
}

/// Read and parse a subtitle file, detecting its format from the extension.
pub fn read_subtitle_file(path: &Path) -> Result<Vec<Cue>> {
    let format = SubtitleFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    format.parse(&text)
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

//! SRT and WebVTT parsing.

use super::Cue;
use crate::error::{MampfError, Result};
use regex::Regex;
use std::sync::LazyLock;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s*-->\s*(\S+)").expect("Invalid regex")
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2})[,.](\d{1,3})$").expect("Invalid regex")
});

/// Parse SubRip (`.srt`) text into cues.
///
/// The numeric index line is optional. Both `,` and `.` are accepted as the
/// millisecond separator; a leading BOM and CRLF line endings are tolerated.
pub fn parse_srt(text: &str) -> Result<Vec<Cue>> {
    let normalized = normalize(text);
    let mut cues = Vec::new();

    for block in blocks(&normalized) {
        let next_index = cues.len() as u32 + 1;
        let (index, timing, body) = if TIMING_LINE.is_match(block[0]) {
            (next_index, block[0], &block[1..])
        } else if block.len() > 1 && TIMING_LINE.is_match(block[1]) {
            let index = block[0].trim().parse::<u32>().map_err(|_| {
                MampfError::InvalidFormat(format!("Invalid SRT cue index: {}", block[0].trim()))
            })?;
            (index, block[1], &block[2..])
        } else {
            return Err(MampfError::InvalidFormat(format!(
                "SRT block without timing line: {}",
                block[0].trim()
            )));
        };

        let (start, end) = parse_timing(timing)?;
        cues.push(Cue::new(index, start, end, body.join("\n").trim()));
    }

    Ok(cues)
}

/// Parse WebVTT (`.vtt`) text into cues.
///
/// NOTE, STYLE and REGION blocks are skipped; cue settings after the end
/// timestamp are ignored. Cues are numbered in file order.
pub fn parse_vtt(text: &str) -> Result<Vec<Cue>> {
    let normalized = normalize(text);
    let mut all_blocks = blocks(&normalized).into_iter();

    match all_blocks.next() {
        Some(header) if header[0].trim_start().starts_with("WEBVTT") => {}
        _ => {
            return Err(MampfError::InvalidFormat(
                "WebVTT file must start with a WEBVTT header".to_string(),
            ))
        }
    }

    let mut cues = Vec::new();
    for block in all_blocks {
        let first = block[0].trim_start();
        if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
            continue;
        }

        let timing_at = block
            .iter()
            .take(2)
            .position(|line| line.contains("-->"))
            .ok_or_else(|| {
                MampfError::InvalidFormat(format!("WebVTT cue without timing line: {}", first))
            })?;

        let (start, end) = parse_timing(block[timing_at])?;
        let body = &block[timing_at + 1..];
        cues.push(Cue::new(
            cues.len() as u32 + 1,
            start,
            end,
            body.join("\n").trim(),
        ));
    }

    Ok(cues)
}

fn normalize(text: &str) -> String {
    text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n")
}

/// Group lines into blank-line separated blocks.
fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut result = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

fn parse_timing(line: &str) -> Result<(f64, f64)> {
    let caps = TIMING_LINE
        .captures(line)
        .ok_or_else(|| MampfError::InvalidFormat(format!("Invalid timing line: {}", line)))?;

    let start = parse_timestamp(&caps[1])?;
    let end = parse_timestamp(&caps[2])?;
    if start > end {
        return Err(MampfError::InvalidFormat(format!(
            "Cue ends before it starts: {}",
            line.trim()
        )));
    }

    Ok((start, end))
}

fn parse_timestamp(value: &str) -> Result<f64> {
    let caps = TIMESTAMP
        .captures(value)
        .ok_or_else(|| MampfError::InvalidFormat(format!("Invalid timestamp: {}", value)))?;

    let field = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let fraction_digits = caps.get(4).map(|m| m.as_str().len()).unwrap_or(3) as i32;

    Ok(field(1) * 3600.0 + field(2) * 60.0 + field(3) + field(4) / 10f64.powi(fraction_digits))
}

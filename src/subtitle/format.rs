//! Subtitle composition (SRT, VTT) and chunk export formats.

use super::Cue;

/// Output formats for the `chunk` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use json, srt, or vtt.", s)),
        }
    }
}

/// Compose SubRip text, numbering cues from 1.
pub fn format_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(cue.start_seconds),
            format_srt_timestamp(cue.end_seconds)
        ));
        output.push_str(&cue.content);
        output.push_str("\n\n");
    }

    output
}

/// Compose WebVTT text, numbering cues from 1.
pub fn format_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(cue.start_seconds),
            format_vtt_timestamp(cue.end_seconds)
        ));
        output.push_str(&cue.content);
        output.push_str("\n\n");
    }

    output
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::{parse_srt, parse_vtt};

    fn sample_cues() -> Vec<Cue> {
        vec![
            Cue::new(7, 0.0, 2.5, "Hello world."),
            Cue::new(9, 2.5, 5.0, "This is a test."),
        ]
    }

    #[test]
    fn test_format_srt_renumbers() {
        let srt = format_srt(&sample_cues());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world.\n\n2\n"));
        assert_eq!(parse_srt(&srt).unwrap()[1].content, "This is a test.");
    }

    #[test]
    fn test_format_vtt() {
        let vtt = format_vtt(&sample_cues());
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
        assert_eq!(parse_vtt(&vtt).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("SRT".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
    }
}

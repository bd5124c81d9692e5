//! Four-pass subtitle segmentation.
//!
//! Blocks are carried as [`Cue`]s so that the intermediate and final results
//! can be written back out as subtitle files.

use super::ChunkingConfig;
use crate::error::Result;
use crate::subtitle::Cue;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s+").expect("Invalid regex"));

/// Run all four passes over `cues`.
pub fn segment_cues(cues: &[Cue], config: &ChunkingConfig) -> Result<Vec<Cue>> {
    config.validate()?;

    let sentences: Vec<Cue> = cues.iter().flat_map(split_at_sentences).collect();
    debug!("Split into {} sentence-level cues", sentences.len());

    let complete = merge_until_sentence_complete(&sentences);
    debug!("Merged into {} sentence-complete blocks", complete.len());

    let grown = merge_until_min_size(&complete, config.min_chunk_size, config.overlap);
    debug!(
        "Grown to {} blocks (min size: {}, overlap: {})",
        grown.len(),
        config.min_chunk_size,
        config.overlap
    );

    let split: Vec<Cue> = grown
        .iter()
        .flat_map(|block| split_at_word_boundary(block, config.max_chunk_size))
        .collect();
    debug!("Split into {} blocks (max size: {})", split.len(), config.max_chunk_size);

    Ok(split)
}

/// Split a cue after every period that is followed by whitespace.
///
/// The first piece starts at the cue's start and the last ends at the cue's
/// end. Boundaries in between are estimated from each piece's share of the
/// cue's characters.
pub fn split_at_sentences(cue: &Cue) -> Vec<Cue> {
    let content = cue.content.as_str();
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_BREAK.find_iter(content) {
        sentences.push(&content[last..m.start() + 1]);
        last = m.end();
    }
    sentences.push(&content[last..]);

    if sentences.len() <= 1 {
        return vec![cue.clone()];
    }

    let total_chars = cue.char_len();
    let char_duration = if total_chars == 0 {
        0.0
    } else {
        cue.duration() / total_chars as f64
    };

    let count = sentences.len();
    let mut result: Vec<Cue> = Vec::with_capacity(count);
    for (i, sentence) in sentences.into_iter().enumerate() {
        let start = result.last().map_or(cue.start_seconds, |prev| prev.end_seconds);
        let end = if i == count - 1 {
            cue.end_seconds
        } else {
            start + char_duration * sentence.chars().count() as f64
        };
        result.push(Cue::new(cue.index, start, end, sentence));
    }

    result
}

/// Absorb following blocks until the accumulated text ends with a period.
pub fn merge_until_sentence_complete(blocks: &[Cue]) -> Vec<Cue> {
    let mut merged = Vec::new();
    let mut current = 0;

    while current < blocks.len() {
        let mut block = blocks[current].clone();
        let mut end = current;

        while end + 1 < blocks.len() && !blocks[end].content.ends_with('.') {
            end += 1;
            absorb(&mut block, &blocks[end]);
        }

        merged.push(block);
        current = end + 1;
    }

    merged
}

/// Grow blocks until they exceed `min_size` characters.
///
/// The size check happens before each absorption, so a grown block may end
/// well past `min_size`. With `overlap`, the block before and the block after
/// the grown range are added as context without being consumed; a neighbour
/// can therefore appear in two adjacent results.
pub fn merge_until_min_size(blocks: &[Cue], min_size: usize, overlap: bool) -> Vec<Cue> {
    let mut merged = Vec::new();
    let mut current = 0;

    while current < blocks.len() {
        let mut block = blocks[current].clone();
        let mut end = current;

        while end + 1 < blocks.len() && block.char_len() <= min_size {
            end += 1;
            absorb(&mut block, &blocks[end]);
        }

        if overlap {
            if current > 0 {
                let previous = &blocks[current - 1];
                block.content = format!("{} {}", previous.content, block.content);
                block.start_seconds = previous.start_seconds;
            }
            if end + 1 < blocks.len() {
                absorb(&mut block, &blocks[end + 1]);
            }
        }

        merged.push(block);
        current = end + 1;
    }

    merged
}

/// Recursively halve a block by word count until every piece fits `max_size`.
///
/// A single word longer than `max_size` is returned unsplit. The time span is
/// divided by the first half's share of the characters.
pub fn split_at_word_boundary(block: &Cue, max_size: usize) -> Vec<Cue> {
    let total_chars = block.char_len();
    if total_chars <= max_size {
        return vec![block.clone()];
    }

    let words: Vec<&str> = block.content.split_whitespace().collect();
    if words.len() <= 1 {
        return vec![block.clone()];
    }

    let middle = words.len() / 2;
    let first_text = words[..middle].join(" ");
    let second_text = words[middle..].join(" ");

    let share = first_text.chars().count() as f64 / total_chars as f64;
    let split_time = block.start_seconds + block.duration() * share;

    let first = Cue::new(block.index, block.start_seconds, split_time, first_text);
    let second = Cue::new(block.index, split_time, block.end_seconds, second_text);

    let mut result = split_at_word_boundary(&first, max_size);
    result.extend(split_at_word_boundary(&second, max_size));
    result
}

fn absorb(block: &mut Cue, next: &Cue) {
    block.content.push(' ');
    block.content.push_str(&next.content);
    block.end_seconds = next.end_seconds;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MampfError;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_split_at_sentences_interpolates_times() {
        // 10 chars total, first sentence "Hi. " -> "Hi." is 3 chars.
        let cue = Cue::new(1, 0.0, 10.0, "Hi. Bye no");
        let pieces = split_at_sentences(&cue);

        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].content, "Hi.");
        assert_eq!(pieces[1].content, "Bye no");
        assert!(approx(pieces[0].start_seconds, 0.0));
        assert!(approx(pieces[0].end_seconds, 3.0));
        assert!(approx(pieces[1].start_seconds, 3.0));
        assert!(approx(pieces[1].end_seconds, 10.0));
    }

    #[test]
    fn test_split_at_sentences_without_break_returns_cue() {
        let cue = Cue::new(3, 1.0, 2.0, "No break here.");
        assert_eq!(split_at_sentences(&cue), vec![cue.clone()]);

        let abbreviation = Cue::new(4, 1.0, 2.0, "Version 2.5 is out");
        assert_eq!(split_at_sentences(&abbreviation).len(), 1);
    }

    #[test]
    fn test_split_at_sentences_zero_duration() {
        let cue = Cue::new(1, 4.0, 4.0, "One. Two. Three.");
        let pieces = split_at_sentences(&cue);

        assert_eq!(pieces.len(), 3);
        assert!(pieces
            .iter()
            .all(|p| approx(p.start_seconds, 4.0) && approx(p.end_seconds, 4.0)));
    }

    #[test]
    fn test_zero_length_cue_does_not_panic() {
        let cue = Cue::new(1, 0.0, 2.0, "");
        assert_eq!(split_at_sentences(&cue), vec![cue.clone()]);

        let blocks = segment_cues(&[cue], &ChunkingConfig::new(1, 10, true)).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_merge_until_sentence_complete() {
        let blocks = vec![
            Cue::new(1, 0.0, 1.0, "The limit"),
            Cue::new(2, 1.0, 2.0, "of a sequence"),
            Cue::new(3, 2.0, 3.0, "is unique."),
            Cue::new(4, 3.0, 4.0, "Proof follows"),
        ];
        let merged = merge_until_sentence_complete(&blocks);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].content, "The limit of a sequence is unique.");
        assert!(approx(merged[0].start_seconds, 0.0));
        assert!(approx(merged[0].end_seconds, 3.0));
        assert_eq!(merged[1].content, "Proof follows");
    }

    #[test]
    fn test_merge_until_min_size_stops_after_exceeding() {
        let blocks = vec![
            Cue::new(1, 0.0, 1.0, "aaaa."),
            Cue::new(2, 1.0, 2.0, "bbbb."),
            Cue::new(3, 2.0, 3.0, "cccc."),
            Cue::new(4, 3.0, 4.0, "dddd."),
        ];
        let merged = merge_until_min_size(&blocks, 5, false);

        // "aaaa." is 5 chars, not > 5, so one more block is absorbed.
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].content, "aaaa. bbbb.");
        assert_eq!(merged[1].content, "cccc. dddd.");
        assert!(approx(merged[1].start_seconds, 2.0));
    }

    #[test]
    fn test_overlap_adds_exactly_one_neighbour_each_side() {
        let blocks = vec![
            Cue::new(1, 0.0, 1.0, "Alpha is first."),
            Cue::new(2, 1.0, 2.0, "Beta is second."),
            Cue::new(3, 2.0, 3.0, "Gamma is third."),
        ];
        let merged = merge_until_min_size(&blocks, 1, true);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].content, "Alpha is first. Beta is second.");
        assert_eq!(merged[1].content, "Alpha is first. Beta is second. Gamma is third.");
        assert_eq!(merged[2].content, "Beta is second. Gamma is third.");
        assert!(approx(merged[1].start_seconds, 0.0));
        assert!(approx(merged[1].end_seconds, 3.0));

        // The middle block is shared as context by both neighbours.
        let shared = merged.iter().filter(|b| b.content.contains("Beta is second.")).count();
        assert_eq!(shared, 3);
    }

    #[test]
    fn test_split_at_word_boundary_respects_max() {
        let block = Cue::new(1, 0.0, 8.0, "one two three four five six seven eight");
        let pieces = split_at_word_boundary(&block, 10);

        assert!(pieces.iter().all(|p| p.char_len() <= 10));
        assert_eq!(
            pieces.iter().map(|p| p.content.as_str()).collect::<Vec<_>>().join(" "),
            block.content
        );
        assert!(approx(pieces[0].start_seconds, 0.0));
        assert!(approx(pieces.last().unwrap().end_seconds, 8.0));
        for pair in pieces.windows(2) {
            assert!(approx(pair[0].end_seconds, pair[1].start_seconds));
        }
    }

    #[test]
    fn test_split_at_word_boundary_single_word_kept() {
        let block = Cue::new(1, 0.0, 1.0, "Donaudampfschifffahrtsgesellschaft");
        let pieces = split_at_word_boundary(&block, 5);
        assert_eq!(pieces, vec![block]);
    }

    #[test]
    fn test_split_divides_time_by_character_share() {
        // "ab" | "cdef" -> first half is 2 of 7 chars.
        let block = Cue::new(1, 0.0, 7.0, "ab cdef");
        let pieces = split_at_word_boundary(&block, 4);

        assert_eq!(pieces.len(), 2);
        assert!(approx(pieces[0].end_seconds, 2.0));
    }

    #[test]
    fn test_segment_cues_rejects_inverted_bounds() {
        let result = segment_cues(&[], &ChunkingConfig::new(500, 100, false));
        assert!(matches!(result, Err(MampfError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_segment_cues_empty_input() {
        assert!(segment_cues(&[], &ChunkingConfig::default()).unwrap().is_empty());
    }

    fn lecture_cues() -> Vec<Cue> {
        let lines = [
            "Welcome to the lecture on linear algebra. Today we",
            "talk about vector spaces and their bases. A basis is a",
            "linearly independent generating set. Every vector space",
            "has a basis. The proof needs Zorn's lemma in general.",
            "For finite dimensional spaces it is much easier. We start",
            "with a definition. Let V be a vector space over a field K.",
        ];
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| Cue::new(i as u32 + 1, i as f64 * 4.0, i as f64 * 4.0 + 4.0, *line))
            .collect()
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let config = ChunkingConfig::new(60, 120, true);
        let first = segment_cues(&lecture_cues(), &config).unwrap();
        let second = segment_cues(&lecture_cues(), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocks_within_max_size() {
        let config = ChunkingConfig::new(40, 60, true);
        let blocks = segment_cues(&lecture_cues(), &config).unwrap();

        assert!(!blocks.is_empty());
        for block in &blocks {
            let words = block.content.split_whitespace().count();
            assert!(block.char_len() <= 60 || words == 1, "oversized: {}", block.content);
        }
    }

    #[test]
    fn test_sentence_complete_without_overlap() {
        let config = ChunkingConfig::new(50, 1000, false);
        let blocks = segment_cues(&lecture_cues(), &config).unwrap();

        let (last, rest) = blocks.split_last().unwrap();
        for block in rest {
            assert!(block.content.trim_end().ends_with('.'), "incomplete: {}", block.content);
            assert!(block.char_len() > 50);
        }
        assert!(last.content.ends_with('.'));
    }

    #[test]
    fn test_blocks_keep_time_order() {
        let config = ChunkingConfig::new(30, 80, false);
        let blocks = segment_cues(&lecture_cues(), &config).unwrap();

        for block in &blocks {
            assert!(block.start_seconds <= block.end_seconds);
        }
        assert!(approx(blocks[0].start_seconds, 0.0));
        assert!(approx(blocks.last().unwrap().end_seconds, 24.0));
    }
}

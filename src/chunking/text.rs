//! Plain-text chunking by sentence count.

use super::{Chunk, Location};
use crate::error::{MampfError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("Invalid regex"));

/// Split text after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END.find_iter(text) {
        sentences.push(text[last..m.start() + 1].trim());
        last = m.end();
    }
    sentences.push(text[last..].trim());
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Group sentences into chunks of at most `max_sentences_per_chunk`.
pub fn chunk_text(text: &str, location: &Location, max_sentences_per_chunk: usize) -> Vec<Chunk> {
    let sentences = split_sentences(text);
    debug!(
        "Chunking text ({} chars, {} sentences) with {} sentences/chunk",
        text.chars().count(),
        sentences.len(),
        max_sentences_per_chunk
    );

    sentences
        .chunks(max_sentences_per_chunk.max(1))
        .zip(1u32..)
        .map(|(group, position)| Chunk {
            text: group.join(" "),
            location: location.clone(),
            position: Some(position),
        })
        .collect()
}

/// Read and chunk a plain-text file; the file stem becomes the file id.
pub fn chunk_text_file(path: &Path, course_id: &str, max_sentences_per_chunk: usize) -> Result<Vec<Chunk>> {
    info!("Chunking text file: {}", path.display());

    let file_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MampfError::InvalidInput(format!("No file name in {}", path.display())))?;
    let text = std::fs::read_to_string(path)?;

    let location = Location::File {
        course_id: course_id.to_string(),
        file_id: file_id.to_string(),
    };
    Ok(chunk_text(&text, &location, max_sentences_per_chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("Is it true? Yes!  It is.\nNext line. ");
        assert_eq!(sentences, vec!["Is it true?", "Yes!", "It is.", "Next line."]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_chunk_text_groups_sentences() {
        let location = Location::File {
            course_id: "c".to_string(),
            file_id: "notes".to_string(),
        };
        let chunks = chunk_text("A. B. C. D. E.", &location, 2);

        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A. B.", "C. D.", "E."]);
        assert_eq!(chunks[2].position, Some(3));
        assert!(chunks.iter().all(|c| c.location == location));
    }

    #[test]
    fn test_chunk_text_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("week3.txt");
        std::fs::write(&path, "Groups are sets. They have an operation.").unwrap();

        let chunks = chunk_text_file(&path, "algebra", 5).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].location,
            Location::File {
                course_id: "algebra".to_string(),
                file_id: "week3".to_string(),
            }
        );
    }
}

//! Prompt context built from retrieved passages.

use crate::retrieval::RetrievalItem;

/// Number passages from 1, separated by blank lines.
pub fn format_context(items: &[RetrievalItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}: {}", i + 1, item.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Location;

    fn item(text: &str) -> RetrievalItem {
        RetrievalItem {
            score: 0.5,
            text: text.to_string(),
            location: Location::File {
                course_id: "la".to_string(),
                file_id: "notes".to_string(),
            },
            position: Some(0),
        }
    }

    #[test]
    fn test_format_context_numbers_passages() {
        let context = format_context(&[item("First."), item("Second.")]);
        assert_eq!(context, "1: First.\n\n2: Second.");
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }
}

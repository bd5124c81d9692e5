//! Answer synthesis over retrieved lecture passages.
//!
//! The LLM is asked for a JSON object with the answer, a confidence score and
//! the snippets it relied on. Output that does not parse degrades to a fixed
//! "I don't know." answer.

pub mod context;
mod completion;
mod engine;

pub use completion::OpenAiCompletion;
pub use engine::{parse_answer, AnswerEngine, FALLBACK_ANSWER, NO_CONTEXT_ANSWER};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A synthesized answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub confidence_score: f64,
    /// Snippet text mapped to how much the answer relied on it.
    pub source_snippets: HashMap<String, f64>,
}

impl Answer {
    /// An answer with zero confidence and no snippets.
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            confidence_score: 0.0,
            source_snippets: HashMap::new(),
        }
    }
}

/// Text generation backend.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete `prompt` under the given system message.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}

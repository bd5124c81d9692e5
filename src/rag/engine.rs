//! Retrieval-augmented answers with confidence and cited snippets.

use super::context::format_context;
use super::{Answer, CompletionModel};
use crate::config::Prompts;
use crate::error::{MampfError, Result};
use crate::retrieval::{RetrievalItem, Retriever};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const NO_CONTEXT_ANSWER: &str = "I could not find any relevant information to answer this question.";
pub const FALLBACK_ANSWER: &str = "I don't know.";

/// Answers questions from a collection.
pub struct AnswerEngine {
    retriever: Arc<dyn Retriever>,
    completion: Arc<dyn CompletionModel>,
    prompts: Prompts,
}

impl AnswerEngine {
    pub fn new(retriever: Arc<dyn Retriever>, completion: Arc<dyn CompletionModel>) -> Self {
        Self {
            retriever,
            completion,
            prompts: Prompts::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Retrieve context for `question` and ask the LLM.
    ///
    /// Unparseable model output yields [`FALLBACK_ANSWER`] instead of an error.
    #[instrument(skip(self), fields(retriever = self.retriever.name()))]
    pub async fn ask(&self, question: &str, collection: &str, limit: usize) -> Result<Answer> {
        let items = self.retriever.retrieve(question, collection, limit).await?;
        self.answer_from(question, &items).await
    }

    /// Answer from already retrieved passages.
    pub async fn answer_from(&self, question: &str, items: &[RetrievalItem]) -> Result<Answer> {
        if items.is_empty() {
            info!("No passages retrieved");
            return Ok(Answer::new(NO_CONTEXT_ANSWER));
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(items));
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let raw = self.completion.generate(&self.prompts.rag.system, &prompt).await?;
        match parse_answer(&raw) {
            Ok(answer) => {
                info!(confidence = answer.confidence_score, snippets = answer.source_snippets.len(), "Answered");
                Ok(answer)
            }
            Err(e) => {
                warn!(error = %e, "Falling back to default answer");
                Ok(Answer::new(FALLBACK_ANSWER))
            }
        }
    }
}

#[derive(Deserialize)]
struct RawAnswer {
    answer: String,
    confidence_score: f64,
    #[serde(default)]
    source_snippets: HashMap<String, f64>,
}

/// Parse the JSON object spanning the first `{` to the last `}` of `raw`.
pub fn parse_answer(raw: &str) -> Result<Answer> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(MampfError::Parse("No JSON object in model output".to_string())),
    };

    let parsed: RawAnswer = serde_json::from_str(&raw[start..=end])
        .map_err(|e| MampfError::Parse(format!("Invalid answer JSON: {}", e)))?;

    Ok(Answer {
        answer: parsed.answer,
        confidence_score: parsed.confidence_score.clamp(0.0, 1.0),
        source_snippets: parsed.source_snippets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::tests::lecture_index;
    use crate::retrieval::DenseRetriever;
    use crate::testing::FakeEmbedder;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and records the prompt it was given.
    struct CannedCompletion {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedCompletion {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for CannedCompletion {
        async fn generate(&self, _system: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    async fn engine(completion: Arc<CannedCompletion>) -> AnswerEngine {
        let index = lecture_index().await;
        let retriever = Arc::new(DenseRetriever::new(Arc::new(FakeEmbedder::default()), index));
        AnswerEngine::new(retriever, completion)
    }

    #[test]
    fn test_parse_fenced_answer() {
        let raw = "Sure!\n```json\n{\"answer\": \"A basis spans.\", \"confidence_score\": 0.8, \"source_snippets\": {\"Every vector space has a basis.\": 0.9}}\n```";
        let answer = parse_answer(raw).unwrap();

        assert_eq!(answer.answer, "A basis spans.");
        assert_eq!(answer.confidence_score, 0.8);
        assert_eq!(answer.source_snippets["Every vector space has a basis."], 0.9);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_answer("no json here"), Err(MampfError::Parse(_))));
        assert!(matches!(parse_answer("} backwards {"), Err(MampfError::Parse(_))));
        assert!(matches!(parse_answer("{\"confidence_score\": 1}"), Err(MampfError::Parse(_))));
    }

    #[tokio::test]
    async fn test_ask_passes_numbered_context() {
        let completion = CannedCompletion::new(r#"{"answer": "Yes.", "confidence_score": 0.6, "source_snippets": {}}"#);
        let engine = engine(completion.clone()).await;

        let answer = engine.ask("basis of a vector space", "Lectures", 2).await.unwrap();
        assert_eq!(answer.answer, "Yes.");

        let prompts = completion.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("1: "));
        assert!(prompts[0].contains("2: "));
        assert!(!prompts[0].contains("3: "));
        assert!(prompts[0].contains("basis of a vector space"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back() {
        let engine = engine(CannedCompletion::new("I think it is a basis.")).await;
        let answer = engine.ask("basis", "Lectures", 3).await.unwrap();

        assert_eq!(answer.answer, FALLBACK_ANSWER);
        assert_eq!(answer.confidence_score, 0.0);
        assert!(answer.source_snippets.is_empty());
    }

    #[tokio::test]
    async fn test_no_passages_skips_llm() {
        let completion = CannedCompletion::new("unused");
        let engine = engine(completion.clone()).await;

        let answer = engine.answer_from("anything", &[]).await.unwrap();
        assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
        assert!(completion.prompts.lock().unwrap().is_empty());
    }
}

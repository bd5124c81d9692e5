//! Prompt templates for answer synthesis.
//!
//! The RAG prompt can be replaced by placing a `rag.toml` in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answering a question from retrieved lecture passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    /// Template with `{{question}}` and `{{context}}` placeholders.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You answer questions about recorded university lectures using only the numbered transcript passages you are given.
Rephrase to keep the answer short. If the passages do not contain the answer, say "I don't know".

Confidence score (0.0-1.0):
- 1.0: the answer is stated directly in a passage
- 0.7-0.9: the answer follows from the passages
- 0.3-0.6: the passages contain partial information
- 0.0-0.2: the passages barely touch the question

Supporting snippets must be verbatim, short (one sentence or part of one) and each carry a relevance score from 0 to 1. Mark omitted text inside a snippet with "[...]"."#
                .to_string(),
            user: r#"PASSAGES:
{{context}}

QUESTION: {{question}}

Respond with a single JSON object and nothing else:
{
  "answer": "<answer or I don't know>",
  "confidence_score": <0.0-1.0>,
  "source_snippets": {
    "<verbatim snippet>": <relevance 0.0-1.0>
  }
}"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render with config variables first, overridden by `vars`.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rag_prompt_has_placeholders() {
        let prompts = Prompts::default();
        assert!(prompts.rag.user.contains("{{question}}"));
        assert!(prompts.rag.user.contains("{{context}}"));
    }

    #[test]
    fn test_custom_variables_are_overridden() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("course".to_string(), "Analysis I".to_string());
        prompts.variables.insert("question".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is a limit?".to_string());

        let rendered = prompts.render_with_custom("{{course}}: {{question}}", &vars);
        assert_eq!(rendered, "Analysis I: What is a limit?");
    }

    #[test]
    fn test_load_custom_rag_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"Be brief.\"\nuser = \"{{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "Be brief.");
        assert_eq!(prompts.rag.user, "{{question}}");
    }
}

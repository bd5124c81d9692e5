//! Evaluation datasets: questions with graded relevance judgments.
//!
//! ```json
//! {
//!   "config": {"srt_file": "algebra1.srt", "lecture_name": "algebra1"},
//!   "questions": [
//!     {"question": "What is a prime?", "relevant_documents": {"13": 0.9, "15": 0.4}}
//!   ]
//! }
//! ```
//!
//! Document ids are chunk positions within the lecture. The subtitle file is
//! resolved relative to the dataset file.

use crate::error::{MampfError, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Graded relevance per document id, in the order the dataset lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceJudgments(Vec<(u32, f64)>);

impl RelevanceJudgments {
    pub fn new(judgments: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut result = RelevanceJudgments::default();
        for (doc, relevance) in judgments {
            result.insert(doc, relevance);
        }
        result
    }

    /// Set a judgment; a repeated id keeps its first slot.
    fn insert(&mut self, doc: u32, relevance: f64) {
        match self.0.iter_mut().find(|(d, _)| *d == doc) {
            Some(entry) => entry.1 = relevance,
            None => self.0.push((doc, relevance)),
        }
    }

    /// Relevance of `doc`, or 0 if it was not judged.
    pub fn get(&self, doc: u32) -> f64 {
        self.0
            .iter()
            .find(|(d, _)| *d == doc)
            .map(|(_, r)| *r)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, f64)> {
        self.0.iter()
    }

    /// Relevance values in dataset order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, r)| *r)
    }
}

impl fmt::Display for RelevanceJudgments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (doc, relevance)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", doc, relevance)?;
        }
        write!(f, "}}")
    }
}

impl<'de> Deserialize<'de> for RelevanceJudgments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct JudgmentsVisitor;

        impl<'de> Visitor<'de> for JudgmentsVisitor {
            type Value = RelevanceJudgments;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from document id to relevance")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut judgments = RelevanceJudgments::default();
                while let Some((key, relevance)) = map.next_entry::<String, f64>()? {
                    let doc = key.trim().parse::<u32>().map_err(|_| {
                        de::Error::custom(format!("document id '{}' is not a non-negative integer", key))
                    })?;
                    judgments.insert(doc, relevance);
                }
                Ok(judgments)
            }
        }

        deserializer.deserialize_map(JudgmentsVisitor)
    }
}

/// One evaluation question.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub relevant_documents: RelevanceJudgments,
}

#[derive(Deserialize)]
struct RawConfig {
    srt_file: PathBuf,
    lecture_name: String,
}

#[derive(Deserialize)]
struct RawDataset {
    config: RawConfig,
    questions: Vec<Question>,
}

/// A loaded evaluation dataset. Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct EvaluationDataset {
    /// File stem of the dataset file.
    pub name: String,
    pub lecture_name: String,
    /// Subtitle file, resolved against the dataset's directory.
    pub srt_path: PathBuf,
    pub questions: Vec<Question>,
}

impl EvaluationDataset {
    /// Load and validate a dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MampfError::InvalidInput(format!("No file name in {}", path.display())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        Self::from_json(&content, name, base_dir)
    }

    /// Parse dataset JSON; `base_dir` anchors the relative subtitle path.
    pub fn from_json(content: &str, name: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawDataset = serde_json::from_str(content)
            .map_err(|e| MampfError::InvalidFormat(format!("Invalid dataset '{}': {}", name, e)))?;

        for (i, question) in raw.questions.iter().enumerate() {
            for (doc, relevance) in question.relevant_documents.iter() {
                if !relevance.is_finite() || !(0.0..=1.0).contains(relevance) {
                    return Err(MampfError::InvalidFormat(format!(
                        "Question {} of '{}' has relevance {} for document {}; expected a value in [0, 1]",
                        i, name, relevance, doc
                    )));
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            lecture_name: raw.config.lecture_name,
            srt_path: base_dir.join(raw.config.srt_file),
            questions: raw.questions,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Name of the scratch collection this dataset is evaluated in.
    pub fn collection_name(&self) -> String {
        format!("{}_benchmark", self.name)
    }
}

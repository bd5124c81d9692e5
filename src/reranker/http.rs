//! Cross-encoder client for a `/v1/rerank` endpoint (TEI, vLLM, Infinity).

use super::{CrossEncoder, RankedDocument};
use crate::config::RerankerSettings;
use crate::error::{MampfError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP cross-encoder. Scores are the service's raw relevance scores.
pub struct HttpCrossEncoder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultRaw>,
}

#[derive(Deserialize)]
struct RerankResultRaw {
    index: usize,
    relevance_score: f32,
}

impl HttpCrossEncoder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MampfError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/rerank", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &RerankerSettings) -> Result<Self> {
        Self::new(
            &settings.base_url,
            &settings.model,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Same service, different model.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    #[instrument(skip(self, documents), fields(model = %self.model, count = documents.len()))]
    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<RankedDocument>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: &self.model,
            query,
            documents,
            top_n: documents.len(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                MampfError::ServiceUnavailable(format!(
                    "Reranker at {} for query '{}': {}",
                    self.endpoint, query, e
                ))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MampfError::ServiceUnavailable(format!(
                "Reranker returned {} for query '{}': {}",
                status, query, body
            )));
        }

        let body: RerankResponse = resp
            .json()
            .await
            .map_err(|e| MampfError::Parse(format!("Failed to parse reranker response: {}", e)))?;

        let mut results: Vec<RankedDocument> = body
            .results
            .into_iter()
            .map(|r| RankedDocument {
                index: r.index,
                score: r.relevance_score,
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        debug!("Reranked {} documents", results.len());
        Ok(results)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn fake_rerank(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["model"], "BAAI/bge-reranker-v2-m3");
        assert_eq!(body["top_n"], 3);
        Json(json!({
            "results": [
                {"index": 0, "relevance_score": 0.1},
                {"index": 2, "relevance_score": 0.9},
                {"index": 1, "relevance_score": 0.5},
            ]
        }))
    }

    #[tokio::test]
    async fn test_rank_sorts_by_score() {
        let app = Router::new().route("/v1/rerank", post(fake_rerank));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let encoder = HttpCrossEncoder::new(
            &format!("http://{}/", addr),
            "BAAI/bge-reranker-v2-m3",
            Duration::from_secs(5),
        )
        .unwrap();
        let documents = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = encoder.rank("query", &documents).await.unwrap();

        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(ranked[0].score, 0.9);
    }

    #[tokio::test]
    async fn test_empty_documents_skip_request() {
        let encoder =
            HttpCrossEncoder::new("http://127.0.0.1:9", "m", Duration::from_secs(1)).unwrap();
        assert!(encoder.rank("query", &[]).await.unwrap().is_empty());
        assert_eq!(encoder.with_model("other").model(), "other");
    }
}

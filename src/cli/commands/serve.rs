//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for lecture search, question answering, ingestion
//! and collection maintenance.

use crate::chunking::ChunkingConfig;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::MampfError;
use crate::orchestrator::{CollectionStatus, IngestResult, Pipeline};
use crate::rag::Answer;
use crate::retrieval::{RetrievalItem, RetrieverKind};
use crate::vector_store::CollectionInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let app = router(pipeline);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("mampfsearch API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Search", "POST   /lectures/search");
    Output::kv("Ask", "POST   /lectures/ask");
    Output::kv("Ingest", "POST   /ingest");
    Output::kv("Init", "POST   /maintenance/init");
    Output::kv("Status", "GET    /maintenance/status");
    Output::kv("Delete", "DELETE /maintenance/collections/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/lectures/search", post(search))
        .route("/lectures/ask", post(ask))
        .route("/ingest", post(ingest))
        .route("/maintenance/init", post(init_collection))
        .route("/maintenance/status", get(status))
        .route("/maintenance/collections/{name}", delete(delete_collection))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    collection_name: Option<String>,
    retriever_type: Option<String>,
    limit: Option<usize>,
    reranking: Option<bool>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    collection_name: Option<String>,
    retriever_type: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct IngestRequest {
    srt_file: String,
    course_id: String,
    lecture_id: String,
    collection_name: Option<String>,
    min_chunk_size: Option<usize>,
    max_chunk_size: Option<usize>,
    overlap: Option<bool>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    collections: Vec<CollectionInfo>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Library error rendered as a JSON error body.
struct ApiError(MampfError);

impl From<MampfError> for ApiError {
    fn from(e: MampfError) -> Self {
        Self(e)
    }
}

fn status_for(e: &MampfError) -> StatusCode {
    match e {
        MampfError::InvalidConfiguration(_) | MampfError::InvalidFormat(_) | MampfError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        MampfError::IndexNotFound(_) => StatusCode::NOT_FOUND,
        MampfError::Embedding(_) | MampfError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

impl AppState {
    fn collection(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.pipeline.settings().vector_store.collection.clone())
    }

    fn kind(&self, requested: Option<&str>) -> ApiResult<RetrieverKind> {
        let name = requested.unwrap_or(&self.pipeline.settings().retrieval.retriever);
        name.parse().map_err(|e| ApiError(MampfError::InvalidInput(e)))
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.pipeline.settings().retrieval.limit)
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Json<Vec<RetrievalItem>>> {
    let kind = state.kind(req.retriever_type.as_deref())?;
    let reranking = req.reranking.unwrap_or(state.pipeline.settings().retrieval.reranking);
    let retriever = state.pipeline.retriever(kind, reranking);

    let items = retriever
        .retrieve(&req.query, &state.collection(req.collection_name), state.limit(req.limit))
        .await?;
    Ok(Json(items))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> ApiResult<Json<Answer>> {
    let kind = state.kind(req.retriever_type.as_deref())?;
    let retriever = state.pipeline.retriever(kind, state.pipeline.settings().retrieval.reranking);
    let engine = state.pipeline.answer_engine(retriever);

    let answer = engine
        .ask(&req.question, &state.collection(req.collection_name), state.limit(req.limit))
        .await?;
    Ok(Json(answer))
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<(StatusCode, Json<IngestResult>)> {
    let defaults = ChunkingConfig::from(&state.pipeline.settings().chunking);
    let config = ChunkingConfig::new(
        req.min_chunk_size.unwrap_or(defaults.min_chunk_size),
        req.max_chunk_size.unwrap_or(defaults.max_chunk_size),
        req.overlap.unwrap_or(defaults.overlap),
    );

    let result = state
        .pipeline
        .ingest_subtitles(
            std::path::Path::new(&req.srt_file),
            &req.course_id,
            &req.lecture_id,
            &state.collection(req.collection_name),
            &config,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn init_collection(State(state): State<Arc<AppState>>) -> ApiResult<(StatusCode, Json<CollectionStatus>)> {
    let status = state.pipeline.ensure_collection(&state.collection(None)).await?;
    let code = if status.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((code, Json(status)))
}

async fn status(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    let index = state.pipeline.index();
    let mut collections = Vec::new();
    for name in index.list_collections().await? {
        collections.push(index.collection_info(&name).await?);
    }
    Ok(Json(StatusResponse {
        status: "ok",
        collections,
    }))
}

async fn delete_collection(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> ApiResult<StatusCode> {
    state.pipeline.index().delete_collection(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::CompletionModel;
    use crate::testing::{FakeEmbedder, KeywordCrossEncoder};
    use crate::vector_store::MemoryVectorIndex;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedCompletion;

    #[async_trait]
    impl CompletionModel for FixedCompletion {
        async fn generate(&self, _system: &str, _prompt: &str) -> crate::error::Result<String> {
            Ok(r#"{"answer": "A basis is linearly independent.", "confidence_score": 0.9, "source_snippets": {"linearly independent": 1.0}}"#.to_string())
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    async fn spawn_server() -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("l01.srt"),
            "1\n00:00:00,000 --> 00:00:04,000\nEvery vector space has a basis.\n\n\
             2\n00:00:04,000 --> 00:00:08,000\nA basis is linearly independent.\n\n\
             3\n00:00:08,000 --> 00:00:12,000\nThe determinant is multiplicative.\n",
        )
        .unwrap();

        let pipeline = Pipeline::with_components(
            Settings::default(),
            Arc::new(FakeEmbedder::default()),
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(KeywordCrossEncoder),
            Arc::new(FixedCompletion),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(pipeline)).await.unwrap();
        });
        (format!("http://{}", addr), dir)
    }

    #[tokio::test]
    async fn test_ingest_search_ask_delete() {
        let (base, dir) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client.post(format!("{}/maintenance/init", base)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = client
            .post(format!("{}/ingest", base))
            .json(&json!({
                "srt_file": dir.path().join("l01.srt"),
                "course_id": "la",
                "lecture_id": "l01",
                "min_chunk_size": 1,
                "max_chunk_size": 1000,
                "overlap": false
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["inserted"], 3);

        let items: Vec<Value> = client
            .post(format!("{}/lectures/search", base))
            .json(&json!({"query": "linearly independent basis", "retriever_type": "dense", "limit": 2}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["text"], "A basis is linearly independent.");
        assert_eq!(items[0]["location"]["type"], "video");

        let answer: Value = client
            .post(format!("{}/lectures/ask", base))
            .json(&json!({"question": "What is a basis?"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(answer["confidence_score"], 0.9);

        let status: Value = client
            .get(format!("{}/maintenance/status", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["collections"][0]["points"], 3);

        let response = client
            .delete(format!("{}/maintenance/collections/Lectures", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = client
            .delete(format!("{}/maintenance/collections/Lectures", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_errors_map_to_status_codes() {
        let (base, _dir) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/lectures/search", base))
            .json(&json!({"query": "basis", "collection_name": "Physics"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = client
            .post(format!("{}/lectures/search", base))
            .json(&json!({"query": "basis", "retriever_type": "bm25"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("bm25"));
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&MampfError::InvalidFormat("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&MampfError::IndexNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&MampfError::ServiceUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&MampfError::Parse("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

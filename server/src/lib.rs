use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use telusur_core::{EngineConfig, Error, SearchEngine};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Defaults to the engine's configured `top_n`.
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct StatsParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize {
    500
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Every document in the corpus receives a score.
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub index: usize,
    pub doc_id: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub created_at: String,
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_topics: usize,
    pub terms: Vec<TermCount>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub model_path: PathBuf,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

fn api_error(err: Error) -> ApiError {
    match err {
        Error::NotFitted => (StatusCode::SERVICE_UNAVAILABLE, "no model loaded".into()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Build the router over the model at `model_path`.
///
/// A missing or unreadable model is not fatal: the service starts unfitted,
/// answers 503 on query routes and can be filled later via `/admin/reload`.
pub fn build_app(model_path: String, config: EngineConfig) -> Result<Router> {
    let engine = Arc::new(SearchEngine::new(config));
    if let Err(err) = engine.load(&model_path) {
        tracing::warn!(model = %model_path, error = %err, "starting without a model");
    }
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState { engine, model_path: PathBuf::from(model_path), admin_token }))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:index", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.unwrap_or(state.engine.config().top_n).clamp(1, MAX_K);
    let engine = Arc::clone(&state.engine);
    let query = params.q.clone();
    // ranking is CPU-bound; keep it off the async workers
    let (total_hits, results) = tokio::task::spawn_blocking(move || -> telusur_core::Result<_> {
        let snapshot = engine.snapshot()?;
        let snippet_chars = engine.config().snippet_chars;
        let hits = snapshot.search(&engine.analyzer().analyze(&query), k);
        let results = hits
            .into_iter()
            .map(|hit| SearchResult {
                snippet: snapshot.documents()[hit.index].snippet(snippet_chars),
                index: hit.index,
                doc_id: hit.id,
                score: hit.score,
            })
            .collect::<Vec<_>>();
        Ok((snapshot.documents().len(), results))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(api_error)?;

    Ok(Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    match snapshot.documents().get(index) {
        Some(doc) => Ok(Json(serde_json::json!({
            "index": index,
            "doc_id": doc.id,
            "text": doc.text,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document at index {index}"))),
    }
}

pub async fn stats_handler(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    let terms = snapshot
        .vocabulary()
        .most_common(params.limit)
        .into_iter()
        .map(|(term, count)| TermCount { term: term.to_string(), count })
        .collect();
    Ok(Json(StatsResponse {
        created_at: snapshot.created_at().to_string(),
        num_docs: snapshot.documents().len(),
        num_terms: snapshot.vocabulary().len(),
        num_topics: snapshot.model().num_topics(),
        terms,
    }))
}

/// Re-read the model file and swap it in. The running model stays on failure.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let engine = Arc::clone(&state.engine);
    let path = state.model_path.clone();
    let snapshot = tokio::task::spawn_blocking(move || engine.load(&path))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|err| {
            tracing::error!(model = %state.model_path.display(), error = %err, "reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;
    tracing::info!(model = %state.model_path.display(), num_docs = snapshot.documents().len(), "model reloaded");
    Ok(Json(serde_json::json!({
        "created_at": snapshot.created_at(),
        "num_docs": snapshot.documents().len(),
        "num_topics": snapshot.model().num_topics(),
    })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

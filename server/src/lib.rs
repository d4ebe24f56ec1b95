use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use catalog_core::{CatalogSearch, EngineConfig, FileCatalog, Hit, IndexStatus, SourceType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Per-source limit; the configured defaults apply when absent.
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub degraded: bool,
    pub total_hits: usize,
    pub primary_hits: Vec<Hit>,
    pub licensed_hits: Vec<Hit>,
    pub ebook_hits: Vec<Hit>,
    pub combined_hits: Vec<Hit>,
}

#[derive(Deserialize)]
pub struct SuggestParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<String>,
    pub degraded: bool,
}

/// Where each catalog partition lives on disk.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub primary: PathBuf,
    pub licensed: PathBuf,
    pub ebooks: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<CatalogSearch>,
}

pub fn build_search(paths: &CatalogPaths, config: EngineConfig) -> CatalogSearch {
    CatalogSearch::new(
        Arc::new(FileCatalog::new(&paths.primary, SourceType::Primary)),
        Arc::new(FileCatalog::new(&paths.licensed, SourceType::Licensed)),
        Arc::new(FileCatalog::new(&paths.ebooks, SourceType::Ebook)),
        config,
    )
}

fn cors_layer() -> CorsLayer {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_app(search: Arc<CatalogSearch>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/index/status", get(status_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(AppState { search })
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let outcome = match params.k {
        Some(k) => state.search.search_with_limit(&params.q, k).await,
        None => state.search.search(&params.q).await,
    };
    if outcome.degraded {
        tracing::warn!(query = %params.q, "served degraded search results");
    }
    let elapsed = start.elapsed();
    Json(SearchResponse {
        query: params.q,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        degraded: outcome.degraded,
        total_hits: outcome.combined_hits.len(),
        primary_hits: outcome.primary_hits,
        licensed_hits: outcome.licensed_hits,
        ebook_hits: outcome.ebook_hits,
        combined_hits: outcome.combined_hits,
    })
}

pub async fn suggest_handler(State(state): State<AppState>, Query(params): Query<SuggestParams>) -> Json<SuggestResponse> {
    let limit = params.k.unwrap_or(state.search.config().suggest_limit);
    let out = state.search.suggest(&params.q, limit).await;
    Json(SuggestResponse { query: params.q, suggestions: out.suggestions, degraded: out.degraded })
}

pub async fn status_handler(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.search.manager().status())
}

async fn rebuild_handler(State(state): State<AppState>) -> Result<Json<IndexStatus>, (StatusCode, String)> {
    let manager = state.search.manager();
    match manager.rebuild().await {
        Ok(_) => Ok(Json(manager.status())),
        Err(e) => Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

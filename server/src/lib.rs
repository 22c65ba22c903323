use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use invert_core::persist::IndexPaths;
use invert_core::reader::{DocStats, PostingLookup, TermStats};
use invert_core::{IndexError, IndexReader};
use serde::Deserialize;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct PostingsParams {
    pub term: String,
    pub doc: String,
}

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<IndexReader>,
}

/// Error body returned for failed lookups.
pub struct ApiError(IndexError);

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IndexError::NotFound { .. } => StatusCode::NOT_FOUND,
            IndexError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "lookup failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn build_app(index_dir: impl AsRef<FsPath>) -> Result<Router> {
    // Catalogs are loaded once at startup
    let index_dir = index_dir.as_ref();
    let reader = IndexReader::open(IndexPaths::new(index_dir))?;
    tracing::info!(
        index = %index_dir.display(),
        docs = reader.num_docs(),
        terms = reader.num_terms(),
        "index loaded"
    );
    let app_state = AppState { reader: Arc::new(reader) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/doc/*name", get(doc_handler))
        .route("/term/:term", get(term_handler))
        .route("/postings", get(postings_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DocStats>, ApiError> {
    Ok(Json(state.reader.document_stats(&name)?))
}

pub async fn term_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<TermStats>, ApiError> {
    Ok(Json(state.reader.term_stats(&term)?))
}

pub async fn postings_handler(
    State(state): State<AppState>,
    Query(params): Query<PostingsParams>,
) -> Result<Json<PostingLookup>, ApiError> {
    Ok(Json(state.reader.postings(&params.term, &params.doc)?))
}

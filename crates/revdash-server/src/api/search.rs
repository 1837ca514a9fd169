use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use revdash_sentiment::{AnnotatedReview, BuildReport, ScoredReview, SearchResults};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_service_error, ApiError, ApiResponse, AppState};

const DEFAULT_TOP_K: usize = 20;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

pub(super) async fn semantic_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchResults<ScoredReview>>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let data = state
        .service
        .semantic_search(&body.query, body.top_k)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn keyword_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchResults<AnnotatedReview>>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let data = state
        .service
        .keyword_search(&body.query, body.top_k)
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn build_embeddings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BuildReport>>, ApiError> {
    let data = state
        .service
        .build_embeddings()
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

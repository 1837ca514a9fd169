use axum::{
    extract::{Query, State},
    Extension, Json,
};
use revdash_sentiment::{CorpusStatistics, ReviewPage, ReviewQuery, Trends};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PER_PAGE: usize = 20;

/// Raw query string; numbers are parsed by hand so bad values get the JSON
/// error envelope instead of axum's plain-text rejection.
#[derive(Debug, Deserialize)]
pub(super) struct ReviewsParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sentiment: Option<String>,
    pub search: Option<String>,
}

fn parse_positive(name: &str, raw: Option<&str>, default: usize) -> Result<usize, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => match value.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(format!("{name} must be a positive integer, got '{value}'")),
        },
    }
}

pub(super) async fn list_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ReviewsParams>,
) -> Result<Json<ApiResponse<ReviewPage>>, ApiError> {
    let page = parse_positive("page", params.page.as_deref(), DEFAULT_PAGE)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;
    let per_page = parse_positive("per_page", params.per_page.as_deref(), DEFAULT_PER_PAGE)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let query = ReviewQuery {
        page,
        per_page,
        sentiment: params.sentiment,
        search: params.search,
    };
    let data = state
        .service
        .list_reviews(&query)
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn statistics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CorpusStatistics>>, ApiError> {
    let data = state
        .service
        .statistics()
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Trends>>, ApiError> {
    let data = state
        .service
        .trends()
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

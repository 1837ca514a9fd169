use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use revdash_sentiment::SentimentScores;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
}

pub(super) async fn analyze_text(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SentimentScores>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let data = state
        .service
        .analyze_text(&body.text)
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

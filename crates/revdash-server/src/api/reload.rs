use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use revdash_sentiment::ReloadReport;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ReloadRequest {
    pub requested_count: usize,
    pub batch_size: Option<usize>,
    /// Grow by the configured batch size when `batch_size` is not given.
    #[serde(default)]
    pub incremental: bool,
}

pub(super) async fn reload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ReloadRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReloadReport>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let batch_size = body
        .batch_size
        .or_else(|| body.incremental.then(|| state.service.reload_batch_size()));

    let data = state
        .service
        .reload(body.requested_count, batch_size)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

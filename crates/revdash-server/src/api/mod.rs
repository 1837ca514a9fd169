mod analyze;
mod reload;
mod reviews;
mod search;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use revdash_sentiment::{ErrorKind, Health, ReviewService, SentimentError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReviewService>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "data_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_service_error(request_id: String, error: &SentimentError) -> ApiError {
    match error.kind() {
        ErrorKind::Client => ApiError::new(request_id, "validation_error", error.to_string()),
        ErrorKind::DataUnavailable => {
            ApiError::new(request_id, "data_unavailable", "review data not loaded")
        }
        ErrorKind::Internal => {
            tracing::error!(error = %error, "review service operation failed");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
    }
}

pub(super) fn map_json_rejection(request_id: String, rejection: &JsonRejection) -> ApiError {
    ApiError::new(request_id, "validation_error", rejection.body_text())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze::analyze_text))
        .route("/api/reviews", get(reviews::list_reviews))
        .route("/api/statistics", get(reviews::statistics))
        .route("/api/trends", get(reviews::trends))
        .route("/api/reload", post(reload::reload))
        .route("/api/semantic-search", post(search::semantic_search))
        .route("/api/keyword-search", post(search::keyword_search))
        .route("/api/semantic/build", post(search::build_embeddings))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Health>> {
    Json(ApiResponse::new(state.service.health(), req_id.0))
}

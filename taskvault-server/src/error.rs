use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Handler-level failures surfaced to HTTP callers.
///
/// The Polish prefixes are part of the API contract the frontend displays
/// verbatim; both map to a 500 with a JSON `detail` field.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Secret retrieval or connection/probe failure
    #[error("BŁĄD BAZY DANYCH: {0}")]
    Database(String),

    /// Insert failed on an otherwise healthy connection
    #[error("BŁĄD ZAPISU: {0}")]
    Write(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        tracing::error!("{detail}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": detail })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

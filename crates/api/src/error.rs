//! Mapping of ledger errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use cashbook_core::cash::CashError;

/// Wrapper that renders a [`CashError`] as `{"error", "message"}` JSON.
#[derive(Debug)]
pub struct ApiError(pub CashError);

impl From<CashError> for ApiError {
    fn from(err: CashError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = self.0.error_code().to_ascii_lowercase();

        let message = if status.is_server_error() {
            error!(error = %self.0, retryable = self.0.is_retryable(), "Cash ledger request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

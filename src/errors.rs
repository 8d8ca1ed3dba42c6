use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

use crate::models::ApiResponse;
use crate::services::notification_service::DispatchError;

/// Error type for the notification API routes.
///
/// Every variant renders as the `{success:false, error}` envelope. Variants that
/// carry a cause keep it for logging only; the response body uses the fixed public
/// message.
#[derive(Debug)]
pub enum ApiError {
    // Request validation
    MissingSubscription,
    InvalidSubscription(String),

    // Registration
    SaveFailed(String),

    // Dispatch
    SendFailed(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingSubscription => write!(f, "No subscription provided"),
            ApiError::InvalidSubscription(msg) => write!(f, "Invalid subscription provided: {}", msg),
            ApiError::SaveFailed(msg) => write!(f, "Failed to save subscription: {}", msg),
            ApiError::SendFailed(msg) => write!(f, "Failed to send notification: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingSubscription | ApiError::InvalidSubscription(_) => StatusCode::BAD_REQUEST,
            ApiError::SaveFailed(_) | ApiError::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response envelope. Never includes the cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MissingSubscription => "No subscription provided",
            ApiError::InvalidSubscription(_) => "Invalid subscription provided",
            ApiError::SaveFailed(_) => "Failed to save subscription",
            ApiError::SendFailed(_) => "Failed to send notification",
        }
    }

    pub fn save_failed(msg: impl Into<String>) -> Self {
        ApiError::SaveFailed(msg.into())
    }

    pub fn send_failed(msg: impl Into<String>) -> Self {
        ApiError::SendFailed(msg.into())
    }

    pub fn invalid_subscription(msg: impl Into<String>) -> Self {
        ApiError::InvalidSubscription(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::failure(self.public_message());

        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::SendFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_keeps_cause() {
        let error = ApiError::send_failed("push service returned 404");
        assert_eq!(error.to_string(), "Failed to send notification: push service returned 404");
        assert_eq!(error.public_message(), "Failed to send notification");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingSubscription.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::invalid_subscription("no endpoint").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::save_failed("bad json").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::send_failed("boom").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_dispatch_error_maps_to_send_failure() {
        let error: ApiError = DispatchError::Config(crate::state::ConfigError::MissingVapidKeys).into();
        assert!(matches!(error, ApiError::SendFailed(_)));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_into_response_hides_cause() {
        let response = ApiError::send_failed("private key rejected").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "error": "Failed to send notification"}));
    }
}

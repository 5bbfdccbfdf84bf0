//! Handler error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse::{AuthError, SessionError};
use serde_json::json;

/// Failure that aborts a request.
///
/// Credential failures never get here; handlers route them through the
/// flash channel. What remains are storage and hashing faults, which are
/// logged in full and answered with a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_internal_details_are_not_returned() {
        let err = ApiError::from(SessionError::Timeout(Duration::from_secs(5)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text, r#"{"error":"Internal server error"}"#);
    }

    #[test]
    fn test_display_is_transparent() {
        let err = ApiError::from(AuthError::HashingFailed);
        assert_eq!(err.to_string(), "Password hashing failed");
    }
}

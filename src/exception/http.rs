use crate::error::RequestError;
use crate::exception::ExceptionFilter;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Default filter: logs the error and answers with a small JSON document.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: RequestError) -> Response {
        let status = error.status();
        if status.is_server_error() {
            tracing::error!(error = %error, "request failed");
        } else {
            tracing::debug!(error = %error, "request rejected");
        }

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": error.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_renders_json_error() {
        let response = HttpExceptionFilter.catch(RequestError::ScopeRejected {
            rejected: vec![("users".to_string(), "db down".to_string())],
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], "Scope values failed to settle: users (db down)");
        assert!(body["timestamp"].is_string());
    }
}

//! Error types for the linkpdf server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use linkpdf_core::GenerateError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Body missing, not JSON, or without a string `url`
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidBody(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection.body_text());
                (rejection.status(), "INVALID_BODY", rejection.body_text())
            }
            ApiError::Generate(e) if e.is_client_error() => {
                tracing::warn!("Rejected request: {}", e);
                (StatusCode::BAD_REQUEST, e.code(), e.user_message())
            }
            ApiError::Generate(e) => {
                tracing::error!("PDF generation failed [{}]: {}", e.code(), e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.user_message())
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use linkpdf_core::{NodeRole, RemoteCall, SourceError};
    use serde_json::Value;

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response =
            ApiError::from(GenerateError::InvalidInput("ftp://x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lookup_and_remote_failures_map_to_500() {
        let missing = ApiError::from(GenerateError::NodeNotFound {
            role: NodeRole::Button,
            name: "cta".into(),
        });
        assert_eq!(
            missing.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let remote = ApiError::from(GenerateError::Remote(SourceError::Status {
            call: RemoteCall::ImageDownload,
            status: 502,
        }));
        assert_eq!(
            remote.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_rejection_is_json_shaped() {
        let request = Request::builder()
            .method("POST")
            .uri("/generate_pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"url\": "))
            .unwrap();
        let rejection = Json::<Value>::from_request(request, &())
            .await
            .unwrap_err();

        let response = ApiError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_BODY");
        assert!(!json["error"].as_str().unwrap().is_empty());
    }
}

//! HTTP handlers for the linkpdf server
//!
//! - `GET /health`
//! - `POST /generate_pdf` with `{"url": "https://..."}`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "linkpdf-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Generate request body
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub url: String,
}

/// Handler: POST /generate_pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<LinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    info!("Generate request received");

    let document = state.generator.generate(&req.url).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.media_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", state.output_filename),
            ),
        ],
        document.bytes,
    ))
}

/// Router with every API route, without transport middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/generate_pdf", post(handle_generate_pdf))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handle_health().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "linkpdf-server");
    }
}

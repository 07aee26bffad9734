//! Figma REST API client
//!
//! Implements [`DesignSource`] over:
//! - `GET /v1/files/{key}` for the node tree
//! - `GET /v1/images/{key}?ids=..&format=png&scale=..` for a render URL,
//!   followed by a plain download of that URL
//!
//! One `reqwest::Client` with a request timeout bounds every call.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use linkpdf_core::{DesignSource, DocumentTree, RemoteCall, SourceError};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.figma.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_HEADER: &str = "X-Figma-Token";

/// Response of the image render endpoint
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

fn classify(call: RemoteCall, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout { call }
    } else if let Some(status) = err.status() {
        SourceError::Status {
            call,
            status: status.as_u16(),
        }
    } else if err.is_decode() {
        SourceError::Decode {
            call,
            message: err.to_string(),
        }
    } else {
        // Strip the URL so file keys stay out of the message
        SourceError::Transport {
            call,
            message: err.without_url().to_string(),
        }
    }
}

/// Figma client bound to one access token
#[derive(Clone)]
pub struct FigmaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for FigmaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FigmaClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl FigmaClient {
    pub fn new(token: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_options(token, DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    /// Client against a custom API root (e.g. a local fake) with a custom timeout
    pub fn with_options(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkpdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport {
                call: RemoteCall::TreeFetch,
                message: format!("HTTP client setup failed: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        call: RemoteCall,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        self.http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| classify(call, e))?
            .error_for_status()
            .map_err(|e| classify(call, e))?
            .json::<T>()
            .await
            .map_err(|e| classify(call, e))
    }

    /// Resolve the temporary render URL for a node
    async fn image_url(
        &self,
        file_key: &str,
        node_id: &str,
        scale: f64,
    ) -> Result<String, SourceError> {
        let url = format!("{}/v1/images/{}", self.base_url, file_key);
        let query = [
            ("ids", node_id.to_string()),
            ("format", "png".to_string()),
            ("scale", scale.to_string()),
        ];
        let response: ImagesResponse = self.get_json(RemoteCall::ImageExport, &url, &query).await?;

        if let Some(err) = response.err {
            return Err(SourceError::Decode {
                call: RemoteCall::ImageExport,
                message: err,
            });
        }

        response
            .images
            .get(node_id)
            .cloned()
            .flatten()
            .ok_or_else(|| SourceError::MissingImage {
                node_id: node_id.to_string(),
            })
    }

    /// Download render output; the URL is pre-signed so no token is sent
    async fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let call = RemoteCall::ImageDownload;
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify(call, e))?
            .error_for_status()
            .map_err(|e| classify(call, e))?
            .bytes()
            .await
            .map_err(|e| classify(call, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DesignSource for FigmaClient {
    async fn fetch_tree(&self, file_key: &str) -> Result<DocumentTree, SourceError> {
        info!("Fetching design tree");
        let url = format!("{}/v1/files/{}", self.base_url, file_key);
        let tree: DocumentTree = self.get_json(RemoteCall::TreeFetch, &url, &[]).await?;
        debug!(
            "Design tree '{}' has {} pages",
            tree.name,
            tree.document.children.len()
        );
        Ok(tree)
    }

    async fn export_png(
        &self,
        file_key: &str,
        node_id: &str,
        scale: f64,
    ) -> Result<Vec<u8>, SourceError> {
        info!("Exporting node {} at scale {}", node_id, scale);
        let image_url = self.image_url(file_key, node_id, scale).await?;
        let bytes = self.download(&image_url).await?;
        debug!("Downloaded {} bytes for node {}", bytes.len(), node_id);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    //! Exercises the client against an in-process axum fake of the API

    use std::net::SocketAddr;

    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const TOKEN: &str = "test-token";
    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[derive(Clone)]
    struct FakeFigma {
        addr: SocketAddr,
        /// Node id whose render entry comes back null
        null_node: Option<String>,
    }

    async fn files(headers: HeaderMap, Path(key): Path<String>) -> impl IntoResponse {
        if headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) != Some(TOKEN) {
            return (StatusCode::FORBIDDEN, Json(json!({"status": 403, "err": "Invalid token"})));
        }
        if key != "FILE" {
            return (StatusCode::NOT_FOUND, Json(json!({"status": 404, "err": "Not found"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "name": "Landing",
                "document": {
                    "id": "0:0",
                    "name": "Document",
                    "type": "DOCUMENT",
                    "children": [{
                        "id": "0:1",
                        "name": "Page 2",
                        "type": "CANVAS",
                        "children": [{
                            "id": "12:7",
                            "name": "hero",
                            "type": "FRAME",
                            "absoluteBoundingBox": {"x": 0, "y": 0, "width": 10, "height": 10}
                        }]
                    }]
                }
            })),
        )
    }

    async fn images(
        State(fake): State<FakeFigma>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        assert_eq!(
            headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()),
            Some(TOKEN)
        );
        assert_eq!(params.get("format").map(String::as_str), Some("png"));
        assert_eq!(params.get("scale").map(String::as_str), Some("2"));

        let id = params.get("ids").cloned().unwrap_or_default();
        let url = if fake.null_node.as_deref() == Some(id.as_str()) {
            serde_json::Value::Null
        } else {
            json!(format!("http://{}/render/{}.png", fake.addr, id))
        };
        Json(json!({"err": null, "images": {id: url}}))
    }

    async fn render(headers: HeaderMap) -> impl IntoResponse {
        // Pre-signed download must not carry the API token
        assert!(headers.get(TOKEN_HEADER).is_none());
        PNG_BYTES.to_vec()
    }

    async fn slow() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    }

    async fn spawn_fake(null_node: Option<&str>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = FakeFigma {
            addr,
            null_node: null_node.map(str::to_string),
        };
        let app = Router::new()
            .route("/v1/files/:key", get(files))
            .route("/v1/images/:key", get(images))
            .route("/render/:name", get(render))
            .route("/slow/v1/files/:key", get(slow))
            .with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr, token: &str) -> FigmaClient {
        FigmaClient::with_options(token, format!("http://{}/", addr), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_tree() {
        let addr = spawn_fake(None).await;
        let tree = client(addr, TOKEN).fetch_tree("FILE").await.unwrap();
        assert_eq!(tree.name, "Landing");
        let page = tree.page("Page 2").unwrap();
        assert_eq!(page.find_descendant("hero").unwrap().id, "12:7");
    }

    #[tokio::test]
    async fn test_bad_token_is_status_error() {
        let addr = spawn_fake(None).await;
        let err = client(addr, "wrong").fetch_tree("FILE").await.unwrap_err();
        match err {
            SourceError::Status { call, status } => {
                assert_eq!(call, RemoteCall::TreeFetch);
                assert_eq!(status, 403);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_export_resolves_and_downloads() {
        let addr = spawn_fake(None).await;
        let bytes = client(addr, TOKEN)
            .export_png("FILE", "12:7", 2.0)
            .await
            .unwrap();
        assert_eq!(bytes, PNG_BYTES.to_vec());
    }

    #[tokio::test]
    async fn test_null_render_is_missing_image() {
        let addr = spawn_fake(Some("12:7")).await;
        let err = client(addr, TOKEN)
            .export_png("FILE", "12:7", 2.0)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingImage { ref node_id } if node_id == "12:7"));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let addr = spawn_fake(None).await;
        let client = FigmaClient::with_options(
            TOKEN,
            format!("http://{}/slow", addr),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = client.fetch_tree("FILE").await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Timeout {
                call: RemoteCall::TreeFetch
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(addr, TOKEN).fetch_tree("FILE").await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Transport {
                call: RemoteCall::TreeFetch,
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = FigmaClient::new("super-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret"));
        assert_eq!(client.base_url(), DEFAULT_API_URL);
    }
}

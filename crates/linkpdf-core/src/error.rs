//! Errors raised while generating a document

use std::fmt;

use thiserror::Error;

/// Which configured element a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Frame,
    Button,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Frame => write!(f, "frame"),
            NodeRole::Button => write!(f, "button"),
        }
    }
}

/// Remote call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    TreeFetch,
    ImageExport,
    ImageDownload,
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteCall::TreeFetch => write!(f, "tree fetch"),
            RemoteCall::ImageExport => write!(f, "image export"),
            RemoteCall::ImageDownload => write!(f, "image download"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{call} timed out")]
    Timeout { call: RemoteCall },

    #[error("{call} failed: {message}")]
    Transport { call: RemoteCall, message: String },

    #[error("{call} returned HTTP {status}")]
    Status { call: RemoteCall, status: u16 },

    #[error("{call} returned an unreadable body: {message}")]
    Decode { call: RemoteCall, message: String },

    #[error("no image rendered for node {node_id}")]
    MissingImage { node_id: String },
}

impl SourceError {
    pub fn call(&self) -> RemoteCall {
        match self {
            SourceError::Timeout { call }
            | SourceError::Transport { call, .. }
            | SourceError::Status { call, .. }
            | SourceError::Decode { call, .. } => *call,
            SourceError::MissingImage { .. } => RemoteCall::ImageExport,
        }
    }
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to decode background image: {0}")]
    ImageDecode(String),

    #[error("Unsupported image layout: {0}")]
    UnsupportedImage(String),

    #[error("PDF serialization failed: {0}")]
    Serialize(String),
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Invalid link: {0}")]
    InvalidInput(String),

    #[error("Page '{0}' not found in design document")]
    PageNotFound(String),

    #[error("{role} '{name}' not found")]
    NodeNotFound { role: NodeRole, name: String },

    #[error("{role} '{name}' has no absolute bounding box")]
    MissingBoundingBox { role: NodeRole, name: String },

    #[error("Remote call failed: {0}")]
    Remote(#[from] SourceError),

    #[error("Document composition failed: {0}")]
    Compose(#[from] ComposeError),
}

impl GenerateError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            GenerateError::InvalidInput(_) => "INVALID_INPUT",
            GenerateError::PageNotFound(_) => "PAGE_NOT_FOUND",
            GenerateError::NodeNotFound {
                role: NodeRole::Frame,
                ..
            } => "FRAME_NOT_FOUND",
            GenerateError::NodeNotFound {
                role: NodeRole::Button,
                ..
            } => "BUTTON_NOT_FOUND",
            GenerateError::MissingBoundingBox { .. } => "MISSING_BOUNDING_BOX",
            GenerateError::Remote(_) => "REMOTE_CALL_FAILED",
            GenerateError::Compose(_) => "COMPOSE_FAILED",
        }
    }

    /// Short reason safe to show an end user.
    ///
    /// Never includes credentials, file keys or raw response bodies.
    pub fn user_message(&self) -> String {
        match self {
            GenerateError::InvalidInput(_) => {
                "Link must start with http:// or https://".to_string()
            }
            GenerateError::PageNotFound(name) => format!("Page '{}' not found", name),
            GenerateError::NodeNotFound { role, name } => format!("{} '{}' not found", role, name),
            GenerateError::MissingBoundingBox { role, name } => {
                format!("{} '{}' has no position data", role, name)
            }
            GenerateError::Remote(e) => format!("Design service {} failed", e.call()),
            GenerateError::Compose(_) => "Could not build the PDF".to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, GenerateError::InvalidInput(_))
    }
}

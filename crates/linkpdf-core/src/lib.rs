//! Design-frame to clickable PDF pipeline
//!
//! Takes a design document tree, finds a background frame and a button inside
//! a named page, rasterizes the frame through a [`DesignSource`], and builds a
//! single-page PDF with a link annotation placed over the button artwork.
//!
//! The pieces are usable on their own:
//! - [`tree`]: document tree model and node lookup
//! - [`coords`]: design-space to PDF-space overlay transform
//! - [`compose`]: PDF page construction with lopdf
//! - [`pipeline`]: the request-scoped [`Generator`]

pub mod compose;
pub mod config;
pub mod coords;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod tree;

pub use compose::{compose_document, PDF_MEDIA_TYPE};
pub use config::{
    DesignTarget, ExportSettings, GeneratorConfig, DEFAULT_EXPORT_SCALE, DEFAULT_UNIT_CONVERSION,
};
pub use coords::{overlay_placement, OverlayPlacement, PageSize, TargetRegion};
pub use error::{ComposeError, GenerateError, NodeRole, RemoteCall, SourceError};
pub use pipeline::{validate_link, GeneratedDocument, Generator};
pub use source::DesignSource;
pub use tree::{BoundingBox, DocumentTree, Node};

//! Request pipeline: validate, fetch, locate, export, transform, compose
//!
//! Every step depends on the previous one, so a request runs strictly in
//! sequence and the first failure aborts it with no partial output.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::compose::{compose_document, PDF_MEDIA_TYPE};
use crate::config::{DesignTarget, GeneratorConfig};
use crate::coords::{overlay_placement, OverlayPlacement};
use crate::error::{GenerateError, NodeRole};
use crate::source::DesignSource;
use crate::tree::{BoundingBox, DocumentTree};

const ACCEPTED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Finished PDF for one request
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub placement: OverlayPlacement,
}

/// Frame and button resolved from a single tree fetch
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedNodes {
    pub frame_id: String,
    pub frame_box: BoundingBox,
    pub button_box: BoundingBox,
}

/// Reject anything that is not an http(s) link
pub fn validate_link(url: &str) -> Result<(), GenerateError> {
    if ACCEPTED_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(scheme))
    {
        Ok(())
    } else {
        Err(GenerateError::InvalidInput(url.to_string()))
    }
}

fn locate_box<'a>(
    tree: &'a DocumentTree,
    target: &DesignTarget,
    role: NodeRole,
) -> Result<(&'a str, BoundingBox), GenerateError> {
    let name = target.name_for(role);
    info!("Looking up {} '{}'", role, name);

    let page = tree
        .page(&target.page_name)
        .ok_or_else(|| GenerateError::PageNotFound(target.page_name.clone()))?;

    let node = page.find_descendant(name).ok_or_else(|| {
        error!("{} '{}' not found on page '{}'", role, name, target.page_name);
        GenerateError::NodeNotFound {
            role,
            name: name.to_string(),
        }
    })?;

    let bbox = node
        .absolute_bounding_box
        .ok_or_else(|| GenerateError::MissingBoundingBox {
            role,
            name: name.to_string(),
        })?;

    debug!("Found {} '{}' as node {} at {:?}", role, name, node.id, bbox);
    Ok((node.id.as_str(), bbox))
}

/// Resolve both configured nodes; either one missing fails the request
pub fn locate_nodes(
    tree: &DocumentTree,
    target: &DesignTarget,
) -> Result<LocatedNodes, GenerateError> {
    if tree.page(&target.page_name).is_none() {
        error!("Page '{}' not found in design document", target.page_name);
        return Err(GenerateError::PageNotFound(target.page_name.clone()));
    }

    let (frame_id, frame_box) = locate_box(tree, target, NodeRole::Frame)?;
    let (_, button_box) = locate_box(tree, target, NodeRole::Button)?;

    Ok(LocatedNodes {
        frame_id: frame_id.to_string(),
        frame_box,
        button_box,
    })
}

/// Shared, immutable document generator
pub struct Generator {
    source: Arc<dyn DesignSource>,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(source: Arc<dyn DesignSource>, config: GeneratorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce a PDF whose button opens `url`
    pub async fn generate(&self, url: &str) -> Result<GeneratedDocument, GenerateError> {
        if let Err(e) = validate_link(url) {
            warn!("Rejected link without http(s) scheme");
            return Err(e);
        }

        info!("Generating PDF for link: {}", url);
        let target = &self.config.target;
        let export = &self.config.export;

        let tree = self
            .source
            .fetch_tree(&target.file_key)
            .await
            .inspect_err(|e| error!("Design tree fetch failed: {}", e))?;

        let nodes = locate_nodes(&tree, target)?;

        let background = self
            .source
            .export_png(&target.file_key, &nodes.frame_id, export.scale)
            .await
            .inspect_err(|e| error!("Frame export for node {} failed: {}", nodes.frame_id, e))?;
        debug!("Background image: {} bytes", background.len());

        let placement = overlay_placement(&nodes.frame_box, &nodes.button_box, export);
        if placement.region.is_degenerate() {
            warn!(
                "Button region {:?} has no area; link will not be clickable",
                placement.region
            );
        }

        let bytes = compose_document(&placement.page, &background, &placement.region, url)
            .inspect_err(|e| error!("PDF composition failed: {}", e))?;

        info!(
            "PDF ready: {} bytes, page {}x{} pt, link at {:?}",
            bytes.len(),
            placement.page.width,
            placement.page.height,
            placement.region
        );

        Ok(GeneratedDocument {
            bytes,
            media_type: PDF_MEDIA_TYPE,
            placement,
        })
    }
}

//! Remote design document collaborator

use async_trait::async_trait;

use crate::error::SourceError;
use crate::tree::DocumentTree;

/// Tree source plus rasterizer for one design service.
///
/// Implementations bound every call with a timeout and report it as
/// [`SourceError::Timeout`]; they never retry.
#[async_trait]
pub trait DesignSource: Send + Sync {
    /// Full node tree of the document identified by `file_key`
    async fn fetch_tree(&self, file_key: &str) -> Result<DocumentTree, SourceError>;

    /// PNG bytes of `node_id` rendered at `scale` magnification
    async fn export_png(
        &self,
        file_key: &str,
        node_id: &str,
        scale: f64,
    ) -> Result<Vec<u8>, SourceError>;
}

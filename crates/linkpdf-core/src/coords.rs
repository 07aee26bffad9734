//! Coordinate transformation between design space and PDF space
//!
//! Design boxes use a top-left origin with y growing downward, in design
//! units. The rasterizer renders the frame at `scale` magnification and that
//! raster fills the whole PDF page, so every length goes through the same
//! `scale * unit_conversion` factor and y is flipped against the page height.

use serde::{Deserialize, Serialize};

use crate::config::ExportSettings;
use crate::tree::BoundingBox;

/// Page dimensions in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Link rectangle in PDF space (bottom-left origin, y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl TargetRegion {
    /// Zero-width or zero-height regions are valid but not clickable
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Page size and link region derived together from one frame box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub page: PageSize,
    pub region: TargetRegion,
}

/// Convert one design-unit length to PDF points
fn to_points(length: f64, export: &ExportSettings) -> f64 {
    length * export.scale * export.unit_conversion
}

/// Page size covered by the rasterized frame
pub fn page_size(frame: &BoundingBox, export: &ExportSettings) -> PageSize {
    PageSize {
        width: to_points(frame.width, export),
        height: to_points(frame.height, export),
    }
}

/// Map the button box into PDF space on a page already sized from `frame`
pub fn target_region(
    page: &PageSize,
    frame: &BoundingBox,
    button: &BoundingBox,
    export: &ExportSettings,
) -> TargetRegion {
    // Offset from the frame's top-left corner, still in design units
    let rel_x = button.x - frame.x;
    let rel_y = button.y - frame.y;

    let x1 = to_points(rel_x, export);
    let y1 = page.height - to_points(rel_y + button.height, export);
    let x2 = x1 + to_points(button.width, export);
    let y2 = y1 + to_points(button.height, export);

    TargetRegion { x1, y1, x2, y2 }
}

/// Page size and link region for a frame/button pair.
///
/// The page size is computed once and fed into the region calculation so the
/// background and the link can never disagree about the page height.
pub fn overlay_placement(
    frame: &BoundingBox,
    button: &BoundingBox,
    export: &ExportSettings,
) -> OverlayPlacement {
    let page = page_size(frame, export);
    let region = target_region(&page, frame, button, export);
    OverlayPlacement { page, region }
}

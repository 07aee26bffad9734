//! Fixed generator configuration
//!
//! Everything here is supplied once at process start and stays constant for
//! the lifetime of the [`Generator`](crate::Generator).

use serde::{Deserialize, Serialize};

use crate::error::NodeRole;

/// Pixel-to-point ratio for a 96 DPI source rendered into 72 DPI PDF space.
pub const DEFAULT_UNIT_CONVERSION: f64 = 72.0 / 96.0;

/// Magnification requested from the remote rasterizer.
pub const DEFAULT_EXPORT_SCALE: f64 = 2.0;

/// Which design document and which named elements to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignTarget {
    /// Remote document identifier (Figma file key)
    pub file_key: String,
    /// Page holding both the frame and the button
    pub page_name: String,
    /// Background frame exported as the page image
    pub frame_name: String,
    /// Element whose box becomes the clickable region
    pub button_name: String,
}

impl DesignTarget {
    /// Configured node name for a role
    pub fn name_for(&self, role: NodeRole) -> &str {
        match role {
            NodeRole::Frame => &self.frame_name,
            NodeRole::Button => &self.button_name,
        }
    }
}

/// Scale factors shared by the rasterizer and the overlay transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub scale: f64,
    pub unit_conversion: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_EXPORT_SCALE,
            unit_conversion: DEFAULT_UNIT_CONVERSION,
        }
    }
}

impl ExportSettings {
    /// Both factors must be finite and strictly positive
    pub fn validate(&self) -> Result<(), String> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(format!("export scale must be positive, got {}", self.scale));
        }
        if !(self.unit_conversion.is_finite() && self.unit_conversion > 0.0) {
            return Err(format!(
                "unit conversion must be positive, got {}",
                self.unit_conversion
            ));
        }
        Ok(())
    }
}

/// Complete, immutable configuration for a [`Generator`](crate::Generator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub target: DesignTarget,
    #[serde(default)]
    pub export: ExportSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_settings() {
        let settings = ExportSettings::default();
        assert_eq!(settings.scale, 2.0);
        assert_eq!(settings.unit_conversion, 0.75);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_factors() {
        let zero_scale = ExportSettings {
            scale: 0.0,
            unit_conversion: 0.75,
        };
        assert!(zero_scale.validate().is_err());

        let negative_conv = ExportSettings {
            scale: 2.0,
            unit_conversion: -1.0,
        };
        assert!(negative_conv.validate().is_err());

        let nan_scale = ExportSettings {
            scale: f64::NAN,
            unit_conversion: 0.75,
        };
        assert!(nan_scale.validate().is_err());
    }

    #[test]
    fn test_name_for_role() {
        let target = DesignTarget {
            file_key: "abc".into(),
            page_name: "Page 1".into(),
            frame_name: "background".into(),
            button_name: "cta".into(),
        };
        assert_eq!(target.name_for(NodeRole::Frame), "background");
        assert_eq!(target.name_for(NodeRole::Button), "cta");
    }
}

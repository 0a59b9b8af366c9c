//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Static configuration for a mosaic engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicConfig {
    /// Human-readable mosaic name, surfaced in metadata documents.
    pub name: String,
    /// Minimum zoom the archive is published for.
    pub minzoom: u32,
    /// Maximum zoom the archive is published for.
    pub maxzoom: u32,
    /// Default bound on in-flight cell composites per request.
    pub concurrency: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            name: "sentinel-2-digital-twin".to_string(),
            minzoom: 5,
            maxzoom: 10,
            concurrency: 8,
        }
    }
}

//! Descriptive mosaic metadata for a date partition.

use mosaic_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// Bounds/zoom metadata describing the mosaic for one date.
///
/// Produced by resolving the grid index globally rather than per tile; the
/// serving layer embeds it in its own discovery documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicMetadata {
    pub name: String,
    /// Date partition the metadata describes, as `year-month-day`.
    pub date: String,
    /// Union of all grid cell bounds, as `[min_lon, min_lat, max_lon, max_lat]`.
    pub bounds: [f64; 4],
    /// Map center as `(lon, lat, zoom)`.
    pub center: (f64, f64, u32),
    pub minzoom: u32,
    pub maxzoom: u32,
}

impl MosaicMetadata {
    pub fn new(name: String, date: String, bounds: BoundingBox, minzoom: u32, maxzoom: u32) -> Self {
        let (lon, lat) = bounds.center();
        Self {
            name,
            date,
            bounds: [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y],
            center: (lon, lat, minzoom),
            minzoom,
            maxzoom,
        }
    }
}

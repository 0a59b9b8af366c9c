//! Grid cell definitions loaded from GeoJSON.

use mosaic_common::{BoundingBox, MosaicError, MosaicResult};
use serde::Deserialize;

/// One fixed polygon region of the archive's partitioning grid.
///
/// Immutable after load.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// Stable cell code (the `GZD` property of the grid feature).
    pub id: String,
    /// Exterior ring vertices as (lon, lat), without the closing duplicate.
    pub polygon: Vec<(f64, f64)>,
    /// Bounding box of the polygon.
    pub bbox: BoundingBox,
}

impl GridCell {
    /// Build a cell from an id and exterior ring vertices.
    ///
    /// A closing vertex equal to the first is dropped. Rings with fewer
    /// than three distinct vertices are malformed.
    pub fn new(id: impl Into<String>, mut vertices: Vec<(f64, f64)>) -> MosaicResult<Self> {
        let id = id.into();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(MosaicError::grid_load(format!(
                "cell '{}': polygon ring has fewer than 3 vertices",
                id
            )));
        }

        let (first_x, first_y) = vertices[0];
        let mut bbox = BoundingBox::new(first_x, first_y, first_x, first_y);
        for &(x, y) in &vertices[1..] {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }

        Ok(Self {
            id,
            polygon: vertices,
            bbox,
        })
    }
}

/// Raw GeoJSON feature collection shape for grid definitions.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    type_: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Parse a GeoJSON feature collection into grid cells, preserving feature
/// order. Malformed input is fatal: the grid is loaded once at startup and
/// never retried.
pub fn cells_from_geojson(geojson: &str) -> MosaicResult<Vec<GridCell>> {
    let collection: FeatureCollection = serde_json::from_str(geojson)?;
    if collection.type_ != "FeatureCollection" {
        return Err(MosaicError::grid_load(format!(
            "expected a FeatureCollection, got '{}'",
            collection.type_
        )));
    }

    collection
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let id = feature_id(feature).ok_or_else(|| {
                MosaicError::grid_load(format!("feature {} is missing an id property", i))
            })?;

            if feature.geometry.type_ != "Polygon" {
                return Err(MosaicError::grid_load(format!(
                    "cell '{}': expected Polygon geometry, got '{}'",
                    id, feature.geometry.type_
                )));
            }

            let rings: Vec<Vec<[f64; 2]>> =
                serde_json::from_value(feature.geometry.coordinates.clone()).map_err(|e| {
                    MosaicError::grid_load(format!("cell '{}': bad polygon coordinates: {}", id, e))
                })?;
            let exterior = rings.first().ok_or_else(|| {
                MosaicError::grid_load(format!("cell '{}': polygon has no rings", id))
            })?;

            GridCell::new(id, exterior.iter().map(|p| (p[0], p[1])).collect())
        })
        .collect()
}

/// Cell id from the feature properties: `GZD` (the grid zone designator used
/// by the archive's grid file) or a plain `id`.
fn feature_id(feature: &Feature) -> Option<String> {
    for key in ["GZD", "id"] {
        if let Some(serde_json::Value::String(s)) = feature.properties.get(key) {
            return Some(s.clone());
        }
    }
    None
}

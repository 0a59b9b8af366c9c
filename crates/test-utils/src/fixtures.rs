//! Grid definition fixtures and sample builders.
//!
//! The fixture grids are built around Web-Mercator tile z=9/x=482/y=164
//! (lon 158.91..159.61, lat ~53.7..54.2), the tile used by the mosaic
//! integration tests.

use mosaic_common::Sample;
use serde_json::json;

/// Build a grid GeoJSON feature collection from `(id, [min_lon, min_lat,
/// max_lon, max_lat])` rectangles.
pub fn grid_geojson(cells: &[(&str, [f64; 4])]) -> String {
    let features: Vec<serde_json::Value> = cells
        .iter()
        .map(|(id, b)| {
            json!({
                "type": "Feature",
                "properties": {"GZD": id},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [b[0], b[1]],
                        [b[2], b[1]],
                        [b[2], b[3]],
                        [b[0], b[3]],
                        [b[0], b[1]],
                    ]]
                }
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// One cell, `57U`, fully covering the test tile.
pub fn single_cell_grid() -> String {
    grid_geojson(&[("57U", [156.0, 48.0, 162.0, 56.0])])
}

/// Two adjacent cells, `56U` and `57U`, splitting the test tile at
/// lon 159.2 so both intersect it.
pub fn split_cell_grid() -> String {
    grid_geojson(&[
        ("56U", [150.0, 48.0, 159.2, 56.0]),
        ("57U", [159.2, 48.0, 168.0, 56.0]),
    ])
}

/// One far-away cell that intersects neither the test tile nor the test
/// point.
pub fn far_cell_grid() -> String {
    grid_geojson(&[("01C", [-180.0, -80.0, -174.0, -72.0])])
}

/// A constant-valued sample with a uniform mask.
pub fn constant_sample(
    width: u32,
    height: u32,
    bands: &[&str],
    value: f32,
    valid: bool,
    assets: &[&str],
) -> Sample {
    let pixels = (width * height) as usize;
    Sample::new(
        width,
        height,
        bands.iter().map(|b| b.to_string()).collect(),
        vec![value; pixels * bands.len()],
        vec![valid; pixels],
        assets.iter().map(|a| a.to_string()).collect(),
    )
    .expect("fixture buffers are consistent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_geojson_is_parseable() {
        let geojson = split_cell_grid();
        let value: serde_json::Value = serde_json::from_str(&geojson).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["features"][0]["properties"]["GZD"], "56U");
    }

    #[test]
    fn test_constant_sample() {
        let sample = constant_sample(2, 2, &["B02", "B03"], 5.0, true, &["57U"]);
        assert_eq!(sample.band_count(), 2);
        assert!(sample.is_fully_valid());
        assert_eq!(sample.value(1, 3), 5.0);
    }
}

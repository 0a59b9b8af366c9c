//! Color lookup tables for single-band output.

use mosaic_common::{MosaicError, MosaicResult};

/// A 256-entry RGBA lookup table.
#[derive(Clone, PartialEq)]
pub struct ColorMap {
    table: [[u8; 4]; 256],
}

impl std::fmt::Debug for ColorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorMap").finish_non_exhaustive()
    }
}

impl ColorMap {
    /// Discrete map: listed values get their color, everything else is
    /// fully transparent.
    pub fn from_entries(entries: &[(u8, [u8; 4])]) -> Self {
        let mut table = [[0u8; 4]; 256];
        for &(value, color) in entries {
            table[value as usize] = color;
        }
        Self { table }
    }

    /// Continuous map: linear interpolation between sorted color stops,
    /// clamped at the ends, fully opaque.
    pub fn from_stops(stops: &[(u8, [u8; 3])]) -> MosaicResult<Self> {
        if stops.is_empty() {
            return Err(MosaicError::render("colormap needs at least one stop"));
        }
        let mut sorted = stops.to_vec();
        sorted.sort_by_key(|(v, _)| *v);

        let mut table = [[0u8; 4]; 256];
        for (value, entry) in table.iter_mut().enumerate() {
            let value = value as u8;
            let color = interpolate(&sorted, value);
            *entry = [color[0], color[1], color[2], 255];
        }
        Ok(Self { table })
    }

    /// Parse a JSON object mapping pixel values to `[r, g, b, a]` colors,
    /// e.g. `{"0": [0, 0, 0, 0], "255": [255, 255, 255, 255]}`.
    pub fn from_json(source: &str) -> MosaicResult<Self> {
        let map: std::collections::BTreeMap<String, [u8; 4]> = serde_json::from_str(source)
            .map_err(|e| MosaicError::render(format!("invalid colormap: {}", e)))?;

        let mut entries = Vec::with_capacity(map.len());
        for (key, color) in map {
            let value: u8 = key.parse().map_err(|_| {
                MosaicError::render(format!("colormap key '{}' is not a pixel value", key))
            })?;
            entries.push((value, color));
        }
        Ok(Self::from_entries(&entries))
    }

    /// Color for one pixel value.
    pub fn lookup(&self, value: u8) -> [u8; 4] {
        self.table[value as usize]
    }
}

fn interpolate(stops: &[(u8, [u8; 3])], value: u8) -> [u8; 3] {
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if value <= first.0 {
        return first.1;
    }
    if value >= last.0 {
        return last.1;
    }

    for pair in stops.windows(2) {
        let (lo_v, lo_c) = pair[0];
        let (hi_v, hi_c) = pair[1];
        if value >= lo_v && value <= hi_v {
            if hi_v == lo_v {
                return hi_c;
            }
            let t = (value - lo_v) as f64 / (hi_v - lo_v) as f64;
            let mut color = [0u8; 3];
            for i in 0..3 {
                color[i] =
                    (lo_c[i] as f64 + (hi_c[i] as f64 - lo_c[i] as f64) * t).round() as u8;
            }
            return color;
        }
    }
    last.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_entries() {
        let cmap = ColorMap::from_entries(&[(0, [0, 0, 0, 0]), (1, [255, 0, 0, 255])]);
        assert_eq!(cmap.lookup(1), [255, 0, 0, 255]);
        // Unlisted values are transparent.
        assert_eq!(cmap.lookup(2), [0, 0, 0, 0]);
    }

    #[test]
    fn test_interpolated_stops() {
        let cmap = ColorMap::from_stops(&[(0, [0, 0, 0]), (200, [200, 100, 0])]).unwrap();
        assert_eq!(cmap.lookup(0), [0, 0, 0, 255]);
        assert_eq!(cmap.lookup(100), [100, 50, 0, 255]);
        assert_eq!(cmap.lookup(200), [200, 100, 0, 255]);
        // Clamped past the last stop.
        assert_eq!(cmap.lookup(255), [200, 100, 0, 255]);
    }

    #[test]
    fn test_from_json() {
        let cmap = ColorMap::from_json(r#"{"0": [0, 0, 0, 0], "10": [1, 2, 3, 255]}"#).unwrap();
        assert_eq!(cmap.lookup(10), [1, 2, 3, 255]);

        assert!(ColorMap::from_json(r#"{"500": [0, 0, 0, 0]}"#).is_err());
        assert!(ColorMap::from_json("not json").is_err());
    }

    #[test]
    fn test_empty_stops_rejected() {
        assert!(ColorMap::from_stops(&[]).is_err());
    }
}

//! Spectral band names for the Sentinel-2 daily mosaic archive.

use crate::{MosaicError, MosaicResult};
use serde::{Deserialize, Serialize};

/// A spectral band published in the mosaic archive.
///
/// The archive carries a fixed subset of the Sentinel-2 L2A bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Blue (490nm)
    B02,
    /// Green (560nm)
    B03,
    /// Red (665nm)
    B04,
    /// NIR (842nm)
    B08,
    /// SWIR (1610nm)
    B11,
    /// SWIR (2190nm)
    B12,
}

impl Band {
    /// All bands published in the archive, in spectral order.
    pub const ALL: [Band; 6] = [
        Band::B02,
        Band::B03,
        Band::B04,
        Band::B08,
        Band::B11,
        Band::B12,
    ];

    /// Canonical three-character band code.
    pub fn name(&self) -> &'static str {
        match self {
            Band::B02 => "B02",
            Band::B03 => "B03",
            Band::B04 => "B04",
            Band::B08 => "B08",
            Band::B11 => "B11",
            Band::B12 => "B12",
        }
    }

    /// Parse a band name, accepting short forms.
    ///
    /// A bare or `B`-prefixed one or two digit suffix expands to the
    /// canonical three-character code: `"2"` and `"B2"` parse as `B02`,
    /// `"11"` as `B11`. Unknown names fail with `InvalidBandName` before
    /// any I/O is attempted.
    pub fn parse(name: &str) -> MosaicResult<Band> {
        let canonical = Self::canonicalize(name);
        Self::ALL
            .iter()
            .find(|b| b.name() == canonical)
            .copied()
            .ok_or_else(|| MosaicError::InvalidBandName {
                band: name.to_string(),
                known: Self::known_names(),
            })
    }

    /// Expand short-form names to the canonical three-character code.
    fn canonicalize(name: &str) -> String {
        let upper = name.trim().to_ascii_uppercase();
        let digits = upper.strip_prefix('B').unwrap_or(&upper);
        if !digits.is_empty() && digits.len() <= 2 && digits.bytes().all(|b| b.is_ascii_digit()) {
            // "2" -> "B02", "11" -> "B11"
            format!("B{:02}", digits.parse::<u32>().unwrap_or(0))
        } else {
            upper
        }
    }

    /// Comma-separated list of known band codes, for error messages.
    pub fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        assert_eq!(Band::parse("B02").unwrap(), Band::B02);
        assert_eq!(Band::parse("B12").unwrap(), Band::B12);
    }

    #[test]
    fn test_parse_short_forms() {
        // Bare digit suffix and its canonical form resolve to the same band.
        assert_eq!(Band::parse("2").unwrap(), Band::B02);
        assert_eq!(Band::parse("B2").unwrap(), Band::B02);
        assert_eq!(Band::parse("8").unwrap(), Band::B08);
        assert_eq!(Band::parse("11").unwrap(), Band::B11);
        assert_eq!(Band::parse("b4").unwrap(), Band::B04);
    }

    #[test]
    fn test_parse_unknown_band() {
        for bad in ["B01", "B8A", "NDVI", "", "B123"] {
            let err = Band::parse(bad).unwrap_err();
            assert!(matches!(err, MosaicError::InvalidBandName { .. }), "{bad}");
        }
    }
}

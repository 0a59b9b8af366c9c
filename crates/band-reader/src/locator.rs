//! Deterministic asset locator construction.

use mosaic_common::{Band, DateKey};
use serde::{Deserialize, Serialize};

/// Configuration for the archive's storage layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Locator scheme (e.g. "s3")
    pub scheme: String,
    /// Bucket or host name
    pub host: String,
    /// Asset file extension, without the dot
    pub ext: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            scheme: "s3".to_string(),
            host: "sentinel-s2-l2a-mosaic-120".to_string(),
            ext: "tif".to_string(),
        }
    }
}

/// Builds per-band asset locators from the partition key.
///
/// Construction is pure string formatting: no network or filesystem access,
/// and no existence probe. Identical inputs always yield identical locators.
#[derive(Debug, Clone, Default)]
pub struct AssetLocator {
    config: LocatorConfig,
}

impl AssetLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Locator for one band of one cell on one date.
    /// Format: `scheme://host/{year}/{month}/{day}/{cell_id}/{band}.{ext}`
    pub fn locate(&self, cell_id: &str, date: &DateKey, band: Band) -> String {
        format!(
            "{}://{}/{}/{}/{}/{}/{}.{}",
            self.config.scheme,
            self.config.host,
            date.year,
            date.month,
            date.day,
            cell_id,
            band.name(),
            self.config.ext
        )
    }
}

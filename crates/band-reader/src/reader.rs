//! The injected single-asset raster read capability.

use async_trait::async_trait;
use mosaic_common::{MosaicResult, Sample, TileCoord};
use serde::{Deserialize, Serialize};

/// Resampling kind forwarded to the raster primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
}

/// Per-band read options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Resampling kind for tile extraction.
    pub resampling: Resampling,
    /// Value to treat as missing data. The archive's assets do not declare
    /// one, so zero is assumed unless the caller overrides it.
    pub nodata: Option<f64>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            resampling: Resampling::Nearest,
            nodata: Some(0.0),
        }
    }
}

/// Opens raster assets by locator.
///
/// Implementations wrap whatever decode/reprojection stack serves the
/// archive. Expected failure kinds: [`MosaicError::AssetUnreachable`] when
/// the asset cannot be opened or decoded, [`MosaicError::OutsideBounds`]
/// when the requested region does not overlap the asset footprint. Both are
/// recoverable by the mosaic engine.
///
/// [`MosaicError::AssetUnreachable`]: mosaic_common::MosaicError::AssetUnreachable
/// [`MosaicError::OutsideBounds`]: mosaic_common::MosaicError::OutsideBounds
#[async_trait]
pub trait RasterReader: Send + Sync {
    /// Open one asset for reading.
    async fn open(
        &self,
        locator: &str,
        options: &ReadOptions,
    ) -> MosaicResult<Box<dyn RasterHandle>>;
}

/// An open single-band asset.
///
/// Handles hold whatever resources the read primitive needs (connections,
/// decoder state) and release them on drop; nothing is pooled across reads.
#[async_trait]
pub trait RasterHandle: Send + Sync {
    /// Read one tile region, resampled to `tilesize` x `tilesize` pixels.
    async fn read_tile(
        &self,
        tile: TileCoord,
        tilesize: u32,
        options: &ReadOptions,
    ) -> MosaicResult<Sample>;

    /// Read a single point value as a 1x1 sample.
    async fn read_point(&self, lon: f64, lat: f64, options: &ReadOptions)
        -> MosaicResult<Sample>;
}

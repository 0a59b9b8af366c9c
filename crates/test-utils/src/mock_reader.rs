//! A programmable mock of the raster-read capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use band_reader::{RasterHandle, RasterReader, ReadOptions};
use mosaic_common::{MosaicError, MosaicResult, Sample, TileCoord};

/// What a mock asset does when opened and read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Fully valid, constant-valued pixels.
    Constant(f32),
    /// Constant value; only the left half of each row is valid. A 1x1
    /// point read is valid.
    LeftHalf(f32),
    /// Constant value; only the right half of each row is valid. A 1x1
    /// point read is masked.
    RightHalf(f32),
    /// Every pixel masked.
    Empty,
    /// `open` fails with `AssetUnreachable`.
    Unreachable,
    /// Reads fail with `OutsideBounds`.
    OutsideBounds,
    /// Reads fail with a non-recoverable error.
    Corrupt,
}

#[derive(Default)]
struct CallCounts {
    opens: AtomicUsize,
    tile_reads: AtomicUsize,
    point_reads: AtomicUsize,
}

/// Mock [`RasterReader`] with per-locator behaviors and call counters.
///
/// Register behaviors before sharing the reader; unregistered locators use
/// the default behavior (`Unreachable` unless overridden), mirroring a
/// dynamic archive where most assets simply do not exist.
pub struct MockRasterReader {
    behaviors: HashMap<String, MockBehavior>,
    default: MockBehavior,
    counts: Arc<CallCounts>,
}

impl MockRasterReader {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            default: MockBehavior::Unreachable,
            counts: Arc::new(CallCounts::default()),
        }
    }

    /// Override the behavior for unregistered locators.
    pub fn with_default(mut self, behavior: MockBehavior) -> Self {
        self.default = behavior;
        self
    }

    /// Register a behavior for one locator.
    pub fn with_asset(mut self, locator: impl Into<String>, behavior: MockBehavior) -> Self {
        self.behaviors.insert(locator.into(), behavior);
        self
    }

    /// Number of successful or failed `open` calls.
    pub fn open_count(&self) -> usize {
        self.counts.opens.load(Ordering::SeqCst)
    }

    /// Number of tile reads performed.
    pub fn tile_read_count(&self) -> usize {
        self.counts.tile_reads.load(Ordering::SeqCst)
    }

    /// Number of point reads performed.
    pub fn point_read_count(&self) -> usize {
        self.counts.point_reads.load(Ordering::SeqCst)
    }

    /// Total reads of either kind.
    pub fn read_count(&self) -> usize {
        self.tile_read_count() + self.point_read_count()
    }
}

impl Default for MockRasterReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RasterReader for MockRasterReader {
    async fn open(
        &self,
        locator: &str,
        _options: &ReadOptions,
    ) -> MosaicResult<Box<dyn RasterHandle>> {
        self.counts.opens.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behaviors.get(locator).unwrap_or(&self.default);
        if behavior == MockBehavior::Unreachable {
            return Err(MosaicError::unreachable(locator.to_string()));
        }
        Ok(Box::new(MockHandle {
            locator: locator.to_string(),
            behavior,
            counts: self.counts.clone(),
        }))
    }
}

struct MockHandle {
    locator: String,
    behavior: MockBehavior,
    counts: Arc<CallCounts>,
}

impl MockHandle {
    fn sample(&self, width: u32, height: u32) -> MosaicResult<Sample> {
        let pixels = (width * height) as usize;
        let (value, mask) = match self.behavior {
            MockBehavior::Constant(v) => (v, vec![true; pixels]),
            MockBehavior::LeftHalf(v) => {
                let mut mask = vec![false; pixels];
                for row in 0..height as usize {
                    for col in 0..(width as usize).div_ceil(2) {
                        mask[row * width as usize + col] = true;
                    }
                }
                (v, mask)
            }
            MockBehavior::RightHalf(v) => {
                let mut mask = vec![false; pixels];
                for row in 0..height as usize {
                    for col in (width as usize).div_ceil(2)..width as usize {
                        mask[row * width as usize + col] = true;
                    }
                }
                (v, mask)
            }
            MockBehavior::Empty => (0.0, vec![false; pixels]),
            MockBehavior::OutsideBounds => {
                return Err(MosaicError::outside_bounds(self.locator.clone()));
            }
            MockBehavior::Corrupt => {
                return Err(MosaicError::dimension_mismatch(format!(
                    "corrupt asset {}",
                    self.locator
                )));
            }
            MockBehavior::Unreachable => unreachable!("rejected at open"),
        };

        Sample::new(
            width,
            height,
            vec!["data".into()],
            vec![value; pixels],
            mask,
            vec![self.locator.clone()],
        )
    }
}

#[async_trait]
impl RasterHandle for MockHandle {
    async fn read_tile(
        &self,
        _tile: TileCoord,
        tilesize: u32,
        _options: &ReadOptions,
    ) -> MosaicResult<Sample> {
        self.counts.tile_reads.fetch_add(1, Ordering::SeqCst);
        self.sample(tilesize, tilesize)
    }

    async fn read_point(
        &self,
        _lon: f64,
        _lat: f64,
        _options: &ReadOptions,
    ) -> MosaicResult<Sample> {
        self.counts.point_reads.fetch_add(1, Ordering::SeqCst);
        self.sample(1, 1)
    }
}

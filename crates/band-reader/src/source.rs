//! Scoped access to one band asset.

use mosaic_common::{MosaicResult, Sample, TileCoord};
use tracing::{debug, instrument};

use crate::reader::{RasterHandle, RasterReader, ReadOptions};

/// One open band asset, scoped to a single read.
///
/// The underlying handle is released when the source is dropped, on every
/// exit path including cancellation of the owning request future. No
/// connection or content caching is retained across calls.
pub struct BandSource {
    locator: String,
    options: ReadOptions,
    handle: Box<dyn RasterHandle>,
}

impl std::fmt::Debug for BandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BandSource")
            .field("locator", &self.locator)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BandSource {
    /// Open the asset behind a locator.
    #[instrument(skip_all, fields(locator = %locator))]
    pub async fn open(
        reader: &dyn RasterReader,
        locator: String,
        options: ReadOptions,
    ) -> MosaicResult<Self> {
        let handle = reader.open(&locator, &options).await?;
        debug!("opened band asset");
        Ok(Self {
            locator,
            options,
            handle,
        })
    }

    /// The locator this source was opened from.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Read one tile region from the asset.
    pub async fn read_tile(&self, tile: TileCoord, tilesize: u32) -> MosaicResult<Sample> {
        self.handle.read_tile(tile, tilesize, &self.options).await
    }

    /// Read a single point value from the asset.
    pub async fn read_point(&self, lon: f64, lat: f64) -> MosaicResult<Sample> {
        self.handle.read_point(lon, lat, &self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mosaic_common::MosaicError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reader whose handles count how many are still alive.
    struct CountingReader {
        alive: Arc<AtomicUsize>,
        fail_open: bool,
    }

    struct CountingHandle {
        alive: Arc<AtomicUsize>,
    }

    impl Drop for CountingHandle {
        fn drop(&mut self) {
            self.alive.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RasterReader for CountingReader {
        async fn open(
            &self,
            locator: &str,
            _options: &ReadOptions,
        ) -> MosaicResult<Box<dyn RasterHandle>> {
            if self.fail_open {
                return Err(MosaicError::unreachable(locator));
            }
            self.alive.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingHandle {
                alive: self.alive.clone(),
            }))
        }
    }

    #[async_trait]
    impl RasterHandle for CountingHandle {
        async fn read_tile(
            &self,
            _tile: TileCoord,
            tilesize: u32,
            _options: &ReadOptions,
        ) -> MosaicResult<Sample> {
            let pixels = (tilesize * tilesize) as usize;
            Sample::new(
                tilesize,
                tilesize,
                vec!["data".into()],
                vec![1.0; pixels],
                vec![true; pixels],
                vec![],
            )
        }

        async fn read_point(
            &self,
            _lon: f64,
            _lat: f64,
            _options: &ReadOptions,
        ) -> MosaicResult<Sample> {
            Sample::new(1, 1, vec!["data".into()], vec![1.0], vec![true], vec![])
        }
    }

    #[tokio::test]
    async fn test_handle_released_on_drop() {
        let alive = Arc::new(AtomicUsize::new(0));
        let reader = CountingReader {
            alive: alive.clone(),
            fail_open: false,
        };

        {
            let source = BandSource::open(&reader, "s3://b/a.tif".into(), ReadOptions::default())
                .await
                .unwrap();
            assert_eq!(alive.load(Ordering::SeqCst), 1);
            let sample = source.read_tile(TileCoord::new(9, 482, 164), 4).await.unwrap();
            assert!(sample.is_fully_valid());
        }

        assert_eq!(alive.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let reader = CountingReader {
            alive: Arc::new(AtomicUsize::new(0)),
            fail_open: true,
        };
        let err = BandSource::open(&reader, "s3://b/a.tif".into(), ReadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}

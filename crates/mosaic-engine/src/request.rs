//! Immutable per-request configuration.

use band_reader::ReadOptions;
use mosaic_common::{DateKey, TileCoord};

use crate::pixel_selection::PixelSelection;

/// Target coordinates of a mosaic request: a map tile or a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    Tile(TileCoord),
    Point { lon: f64, lat: f64 },
}

/// Requested output bands: an explicit list or a band-math expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BandSelection {
    Bands(Vec<String>),
    Expression(String),
}

impl BandSelection {
    /// Explicit band list.
    pub fn bands<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Bands(names.into_iter().map(Into::into).collect())
    }

    /// Band-math expression source.
    pub fn expression(source: impl Into<String>) -> Self {
        Self::Expression(source.into())
    }
}

/// One mosaic request, passed by value through the pipeline.
///
/// There is no global mutable configuration: everything the pipeline needs
/// to know about a request travels in this struct.
#[derive(Debug, Clone)]
pub struct MosaicRequest {
    pub coordinates: Coordinates,
    pub date: DateKey,
    pub bands: BandSelection,
    pub pixel_selection: PixelSelection,
    pub read_options: ReadOptions,
    /// Tile size scale: 1 = 256x256, 2 = 512x512, 3 = 768x768.
    pub scale: u32,
    /// Iterate candidate cells in reverse load order. A caller-driven
    /// option; nothing selects it automatically.
    pub reverse: bool,
    /// Per-request override of the engine's concurrency bound.
    pub concurrency: Option<usize>,
}

impl MosaicRequest {
    /// Request a map tile.
    pub fn tile(coord: TileCoord, date: DateKey, bands: BandSelection) -> Self {
        Self {
            coordinates: Coordinates::Tile(coord),
            date,
            bands,
            pixel_selection: PixelSelection::default(),
            read_options: ReadOptions::default(),
            scale: 1,
            reverse: false,
            concurrency: None,
        }
    }

    /// Request a point sample.
    pub fn point(lon: f64, lat: f64, date: DateKey, bands: BandSelection) -> Self {
        Self {
            coordinates: Coordinates::Point { lon, lat },
            ..Self::tile(TileCoord::new(0, 0, 0), date, bands)
        }
    }

    pub fn with_bands(mut self, bands: BandSelection) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_pixel_selection(mut self, pixel_selection: PixelSelection) -> Self {
        self.pixel_selection = pixel_selection;
        self
    }

    pub fn with_read_options(mut self, read_options: ReadOptions) -> Self {
        self.read_options = read_options;
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Output tile size in pixels.
    pub fn tilesize(&self) -> u32 {
        self.scale * 256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_request_defaults() {
        let date = DateKey::new(2019, 1, 1).unwrap();
        let request = MosaicRequest::tile(
            TileCoord::new(9, 482, 164),
            date,
            BandSelection::bands(["B02"]),
        );
        assert_eq!(request.pixel_selection, PixelSelection::First);
        assert_eq!(request.tilesize(), 256);
        assert!(!request.reverse);
        assert!(request.concurrency.is_none());
    }

    #[test]
    fn test_point_request() {
        let date = DateKey::new(2019, 1, 1).unwrap();
        let request = MosaicRequest::point(159.0, 54.0, date, BandSelection::bands(["B02", "B03"]))
            .with_reverse(true);
        assert!(matches!(
            request.coordinates,
            Coordinates::Point { lon, lat } if lon == 159.0 && lat == 54.0
        ));
        assert!(request.reverse);
    }

    #[test]
    fn test_scaled_tilesize() {
        let date = DateKey::new(2019, 1, 1).unwrap();
        let request = MosaicRequest::tile(
            TileCoord::new(9, 482, 164),
            date,
            BandSelection::expression("B08/B04"),
        )
        .with_scale(2);
        assert_eq!(request.tilesize(), 512);
    }
}

//! The mosaic state machine: resolve, composite, merge.

use std::sync::Arc;

use band_reader::{AssetLocator, RasterReader};
use futures::future::join_all;
use grid_index::GridIndex;
use mosaic_common::{tile_bbox, DateKey, MosaicError, MosaicResult, Sample};
use tracing::{debug, instrument};

use crate::compositor::{BandPlan, CellCompositor, Region};
use crate::config::MosaicConfig;
use crate::metadata::MosaicMetadata;
use crate::pixel_selection::MosaicAccumulator;
use crate::request::{Coordinates, MosaicRequest};

/// Resolves which grid cells serve a request and merges their composites.
///
/// The engine holds only immutable state and is shared across requests
/// without synchronization.
pub struct MosaicEngine {
    index: Arc<GridIndex>,
    compositor: CellCompositor,
    config: MosaicConfig,
}

impl MosaicEngine {
    pub fn new(
        index: Arc<GridIndex>,
        reader: Arc<dyn RasterReader>,
        locator: AssetLocator,
        config: MosaicConfig,
    ) -> Self {
        Self {
            index,
            compositor: CellCompositor::new(reader, locator),
            config,
        }
    }

    /// Resolve and composite one request.
    ///
    /// Terminates with the merged sample (provenance in `Sample::assets`)
    /// or `NoAssetFound` when no cell intersects the request geometry or
    /// no intersecting cell could be composited.
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn fetch(&self, request: &MosaicRequest) -> MosaicResult<Sample> {
        if !(1..=3).contains(&request.scale) {
            return Err(MosaicError::invalid_parameter("scale", "must be 1-3"));
        }

        // Band names and expressions are validated before any I/O.
        let plan = BandPlan::resolve(&request.bands)?;

        let (region, candidates, target) = match request.coordinates {
            Coordinates::Tile(coord) => (
                Region::Tile {
                    coord,
                    tilesize: request.tilesize(),
                },
                self.index.query_tile(&tile_bbox(&coord)),
                format!("tile {}", coord),
            ),
            Coordinates::Point { lon, lat } => (
                Region::Point { lon, lat },
                self.index.query_point(lon, lat),
                format!("point ({}, {})", lon, lat),
            ),
        };

        if candidates.is_empty() {
            return Err(MosaicError::NoAssetFound(target));
        }

        let mut cell_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        if request.reverse {
            cell_ids.reverse();
        }
        debug!(candidates = cell_ids.len(), "resolved candidate cells");

        let concurrency = request
            .concurrency
            .unwrap_or(self.config.concurrency)
            .max(1);

        // Cells are scheduled in chunks of `concurrency`; merge order stays
        // the candidate order, and `first` stops at the chunk boundary once
        // the accumulator is full.
        let mut accumulator: Option<MosaicAccumulator> = None;
        'cells: for chunk in cell_ids.chunks(concurrency) {
            let composites = chunk.iter().map(|cell_id| {
                self.compositor.composite(
                    cell_id,
                    &request.date,
                    &plan,
                    region,
                    &request.read_options,
                )
            });

            for (cell_id, result) in chunk.iter().zip(join_all(composites).await) {
                match result {
                    Ok(sample) => {
                        let acc = accumulator.get_or_insert_with(|| {
                            MosaicAccumulator::new(request.pixel_selection, &sample)
                        });
                        acc.push(&sample)?;
                        if acc.is_done() {
                            break 'cells;
                        }
                    }
                    Err(e) if e.is_recoverable() => {
                        debug!(cell = %cell_id, error = %e, "skipping cell");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        accumulator
            .and_then(MosaicAccumulator::finalize)
            .ok_or(MosaicError::NoAssetFound(target))
    }

    /// Descriptive bounds/zoom metadata for one date, resolved against the
    /// whole grid rather than per tile.
    pub fn describe(&self, date: &DateKey) -> MosaicMetadata {
        MosaicMetadata::new(
            self.config.name.clone(),
            date.to_string(),
            self.index.bounds(),
            self.config.minzoom,
            self.config.maxzoom,
        )
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn index(&self) -> &GridIndex {
        &self.index
    }
}

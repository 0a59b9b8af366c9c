//! R-tree backed spatial index over the loaded grid cells.

use mosaic_common::{BoundingBox, MosaicError, MosaicResult};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::cell::{cells_from_geojson, GridCell};
use crate::geom::{point_in_polygon, polygon_intersects_rect};

/// R-tree entry: a cell's envelope plus its position in load order.
#[derive(Debug, Clone)]
struct CellEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CellEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable spatial index mapping query geometries to intersecting cells.
///
/// Built once at startup; envelope candidates from the R-tree are confirmed
/// with exact polygon tests, and results come back in grid load order so
/// mosaic assembly is deterministic.
#[derive(Debug)]
pub struct GridIndex {
    cells: Vec<GridCell>,
    tree: RTree<CellEnvelope>,
}

impl GridIndex {
    /// Build the index from a GeoJSON feature collection string.
    pub fn from_geojson(geojson: &str) -> MosaicResult<Self> {
        Self::from_cells(cells_from_geojson(geojson)?)
    }

    /// Build the index from already-parsed cells.
    pub fn from_cells(cells: Vec<GridCell>) -> MosaicResult<Self> {
        if cells.is_empty() {
            return Err(MosaicError::grid_load("grid definition set is empty"));
        }

        let entries = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| CellEnvelope {
                index,
                envelope: AABB::from_corners(
                    [cell.bbox.min_x, cell.bbox.min_y],
                    [cell.bbox.max_x, cell.bbox.max_y],
                ),
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        info!(cells = cells.len(), "loaded grid index");

        Ok(Self { cells, tree })
    }

    /// All cells, in load order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Look up a cell by id.
    pub fn get(&self, id: &str) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell whose polygon intersects the query rectangle (a tile's
    /// bounding box), in load order. An empty result is not an error.
    pub fn query_tile(&self, bbox: &BoundingBox) -> Vec<&GridCell> {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        self.confirm(
            self.tree.locate_in_envelope_intersecting(&envelope),
            |cell| polygon_intersects_rect(&cell.polygon, bbox),
        )
    }

    /// Every cell whose polygon contains the query point, in load order.
    pub fn query_point(&self, lon: f64, lat: f64) -> Vec<&GridCell> {
        let envelope = AABB::from_point([lon, lat]);
        self.confirm(
            self.tree.locate_in_envelope_intersecting(&envelope),
            |cell| point_in_polygon(lon, lat, &cell.polygon),
        )
    }

    /// Union of all cell bounding boxes.
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = self.cells[0].bbox;
        for cell in &self.cells[1..] {
            bounds = bounds.union(&cell.bbox);
        }
        bounds
    }

    fn confirm<'a>(
        &'a self,
        candidates: impl Iterator<Item = &'a CellEnvelope>,
        exact: impl Fn(&GridCell) -> bool,
    ) -> Vec<&'a GridCell> {
        let mut indices: Vec<usize> = candidates
            .map(|entry| entry.index)
            .filter(|&i| exact(&self.cells[i]))
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.cells[i]).collect()
    }
}

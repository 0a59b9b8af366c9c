//! Spatial index over the fixed grid-cell polygons partitioning the archive.
//!
//! Grid definitions are loaded once at startup from a GeoJSON feature
//! collection and never mutated afterwards; the index is safe for
//! unsynchronized concurrent reads.

pub mod cell;
pub mod geom;
pub mod index;

pub use cell::GridCell;
pub use index::GridIndex;

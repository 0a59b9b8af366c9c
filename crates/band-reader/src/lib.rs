//! Per-band asset access: deterministic locators and scoped raster reads.
//!
//! The single-asset decode/reprojection/tile-extraction primitive is not
//! implemented here; it is consumed as an injected [`RasterReader`]
//! capability. This crate owns what surrounds it: building locator strings
//! from the partition key, and holding an open handle for exactly one read.

pub mod locator;
pub mod reader;
pub mod source;

pub use locator::{AssetLocator, LocatorConfig};
pub use reader::{RasterHandle, RasterReader, ReadOptions, Resampling};
pub use source::BandSource;

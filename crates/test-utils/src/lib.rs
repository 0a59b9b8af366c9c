//! Shared test utilities for the s2-mosaic workspace.
//!
//! Provides grid definition fixtures and a programmable mock implementation
//! of the raster-read capability with call-count instrumentation.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod mock_reader;

pub use fixtures::*;
pub use mock_reader::{MockBehavior, MockRasterReader};

//! Post-processing and image encoding for merged mosaic samples.
//!
//! Takes the engine's merged [`Sample`], applies a linear rescale and an
//! optional color formula, then serializes to PNG, JPEG or WebP. PNG is
//! encoded in-crate; JPEG goes through `image` and WebP through `webp`.
//!
//! [`Sample`]: mosaic_common::Sample

pub mod colormap;
pub mod encode;
pub mod formula;
pub mod png;
pub mod post;

pub use colormap::ColorMap;
pub use encode::{encode, ImageFormat};
pub use formula::parse_formula;
pub use post::{post_process, RenderedImage};

use mosaic_common::{MosaicResult, Sample};
use tracing::debug;

/// Rendering options for one request.
#[derive(Debug, Clone, Default)]
pub struct RenderParams {
    /// Per-band linear rescale ranges; one range is broadcast to all bands.
    pub rescale: Vec<(f64, f64)>,
    /// Optional color formula applied after the rescale.
    pub color_formula: Option<String>,
    /// Optional color lookup table for single-band output.
    pub colormap: Option<ColorMap>,
    /// Pinned output format; auto-selected when `None`.
    pub format: Option<ImageFormat>,
    /// Embed the validity mask as an alpha channel.
    pub add_mask: bool,
}

impl RenderParams {
    pub fn new() -> Self {
        Self {
            add_mask: true,
            ..Self::default()
        }
    }
}

/// Post-process and encode a merged sample.
///
/// When no format is pinned, a fully valid sample encodes as JPEG and
/// anything with masked pixels falls back to PNG so the mask survives.
pub fn render(sample: &Sample, params: &RenderParams) -> MosaicResult<(Vec<u8>, ImageFormat)> {
    let image = post_process(sample, &params.rescale, params.color_formula.as_deref())?;
    let format = params
        .format
        .unwrap_or_else(|| ImageFormat::auto_select(sample.is_fully_valid()));

    let bytes = encode(&image, format, params.colormap.as_ref(), params.add_mask)?;
    debug!(format = ?format, bytes = bytes.len(), "encoded tile");
    Ok((bytes, format))
}

//! Output format selection and container encoding.

use image::{codecs::jpeg::JpegEncoder, ColorType, ImageEncoder};
use mosaic_common::{MosaicError, MosaicResult};
use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::png::{create_png, PngColor};
use crate::post::RenderedImage;

const JPEG_QUALITY: u8 = 85;
const WEBP_QUALITY: f32 = 90.0;

/// Supported output image containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Parse a file extension.
    pub fn from_extension(ext: &str) -> MosaicResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::WebP),
            other => Err(MosaicError::invalid_parameter(
                "format",
                format!("unsupported image format '{}'", other),
            )),
        }
    }

    /// MIME type for HTTP responses.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Default format when the caller pins none: lossy JPEG for fully
    /// valid results, lossless PNG (which can carry the mask as alpha)
    /// otherwise.
    pub fn auto_select(fully_valid: bool) -> Self {
        if fully_valid {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Png
        }
    }
}

/// Serialize a post-processed image to the requested container.
///
/// Single-band images go through the colormap when one is supplied and are
/// replicated to gray otherwise; three-band images encode as RGB. When
/// `add_mask` is set the validity mask becomes the alpha channel; JPEG has
/// no alpha and drops it.
pub fn encode(
    image: &RenderedImage,
    format: ImageFormat,
    colormap: Option<&ColorMap>,
    add_mask: bool,
) -> MosaicResult<Vec<u8>> {
    let rgba = to_rgba(image, colormap, add_mask)?;
    let (width, height) = (image.width, image.height);

    match format {
        ImageFormat::Png => {
            if add_mask || colormap.is_some() {
                create_png(&rgba, width, height, PngColor::Rgba)
            } else {
                create_png(&drop_alpha(&rgba), width, height, PngColor::Rgb)
            }
        }
        ImageFormat::Jpeg => {
            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                .write_image(&drop_alpha(&rgba), width, height, ColorType::Rgb8)
                .map_err(|e| MosaicError::render(format!("JPEG encoding failed: {}", e)))?;
            Ok(out)
        }
        ImageFormat::WebP => {
            let memory = if add_mask || colormap.is_some() {
                webp::Encoder::from_rgba(&rgba, width, height).encode(WEBP_QUALITY)
            } else {
                webp::Encoder::from_rgb(&drop_alpha(&rgba), width, height).encode(WEBP_QUALITY)
            };
            Ok(memory.to_vec())
        }
    }
}

/// Expand the banded image to an interleaved RGBA buffer.
fn to_rgba(
    image: &RenderedImage,
    colormap: Option<&ColorMap>,
    add_mask: bool,
) -> MosaicResult<Vec<u8>> {
    let pixels = image.pixel_count();
    let mut rgba = Vec::with_capacity(pixels * 4);

    match (image.bands.as_slice(), colormap) {
        ([band], Some(cmap)) => {
            for px in 0..pixels {
                let [r, g, b, a] = cmap.lookup(band[px]);
                let alpha = if add_mask && !image.mask[px] { 0 } else { a };
                rgba.extend_from_slice(&[r, g, b, alpha]);
            }
        }
        ([band], None) => {
            for px in 0..pixels {
                let v = band[px];
                rgba.extend_from_slice(&[v, v, v, alpha_for(image, px, add_mask)]);
            }
        }
        ([r, g, b], _) => {
            for px in 0..pixels {
                rgba.extend_from_slice(&[r[px], g[px], b[px], alpha_for(image, px, add_mask)]);
            }
        }
        (bands, _) => {
            return Err(MosaicError::render(format!(
                "cannot encode {} bands; select 1 or 3 output bands",
                bands.len()
            )));
        }
    }

    Ok(rgba)
}

fn alpha_for(image: &RenderedImage, px: usize, add_mask: bool) -> u8 {
    if add_mask && !image.mask[px] {
        0
    } else {
        255
    }
}

fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect()
}

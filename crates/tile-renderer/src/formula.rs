//! A small color formula language for RGB output.
//!
//! Comma-separated operations, each applied in order on values normalized
//! to 0..1:
//!
//! ```text
//! gamma rgb 1.85, sigmoidal rgb 15 0.35, saturation 1.15
//! ```
//!
//! `gamma` and `sigmoidal` take a band subset (`r`, `g`, `b` letters in any
//! combination); `saturation` always works on all three bands.

use mosaic_common::{MosaicError, MosaicResult};

use crate::post::RenderedImage;

/// One parsed color operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorOp {
    Gamma { bands: Vec<usize>, gamma: f64 },
    Sigmoidal { bands: Vec<usize>, contrast: f64, bias: f64 },
    Saturation { factor: f64 },
}

/// Parse a color formula into its operations.
pub fn parse_formula(source: &str) -> MosaicResult<Vec<ColorOp>> {
    let segments: Vec<&str> = source
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(MosaicError::render("empty color formula"));
    }

    segments.iter().map(|segment| parse_op(segment)).collect()
}

fn parse_op(segment: &str) -> MosaicResult<ColorOp> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    match tokens.as_slice() {
        ["gamma", bands, gamma] => Ok(ColorOp::Gamma {
            bands: parse_bands(bands)?,
            gamma: parse_number(gamma, "gamma")?,
        }),
        ["sigmoidal", bands, contrast, bias] => Ok(ColorOp::Sigmoidal {
            bands: parse_bands(bands)?,
            contrast: parse_number(contrast, "contrast")?,
            bias: parse_number(bias, "bias")?,
        }),
        ["saturation", factor] => Ok(ColorOp::Saturation {
            factor: parse_number(factor, "saturation factor")?,
        }),
        _ => Err(MosaicError::render(format!(
            "unrecognized color operation '{}'",
            segment
        ))),
    }
}

fn parse_bands(spec: &str) -> MosaicResult<Vec<usize>> {
    let mut bands = Vec::new();
    for c in spec.chars() {
        let index = match c.to_ascii_lowercase() {
            'r' => 0,
            'g' => 1,
            'b' => 2,
            other => {
                return Err(MosaicError::render(format!(
                    "invalid band letter '{}' in color formula",
                    other
                )));
            }
        };
        if !bands.contains(&index) {
            bands.push(index);
        }
    }
    if bands.is_empty() {
        return Err(MosaicError::render("color operation names no bands"));
    }
    Ok(bands)
}

fn parse_number(token: &str, what: &str) -> MosaicResult<f64> {
    token
        .parse()
        .map_err(|_| MosaicError::render(format!("invalid {} '{}'", what, token)))
}

/// Apply parsed operations to a three-band image in place.
pub fn apply_formula(image: &mut RenderedImage, ops: &[ColorOp]) -> MosaicResult<()> {
    if image.bands.len() != 3 {
        return Err(MosaicError::render(format!(
            "color formula requires 3 bands, sample has {}",
            image.bands.len()
        )));
    }

    let pixels = image.pixel_count();
    // Work in normalized f64 until all operations have run.
    let mut channels: Vec<Vec<f64>> = image
        .bands
        .iter()
        .map(|band| band.iter().map(|&v| v as f64 / 255.0).collect())
        .collect();

    for op in ops {
        match op {
            ColorOp::Gamma { bands, gamma } => {
                for &b in bands {
                    for v in &mut channels[b] {
                        *v = v.max(0.0).powf(1.0 / gamma);
                    }
                }
            }
            ColorOp::Sigmoidal { bands, contrast, bias } => {
                for &b in bands {
                    for v in &mut channels[b] {
                        *v = sigmoidal(*v, *contrast, *bias);
                    }
                }
            }
            ColorOp::Saturation { factor } => {
                for px in 0..pixels {
                    let r = channels[0][px];
                    let g = channels[1][px];
                    let b = channels[2][px];
                    // Rec. 601 luma.
                    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
                    channels[0][px] = luma + (r - luma) * factor;
                    channels[1][px] = luma + (g - luma) * factor;
                    channels[2][px] = luma + (b - luma) * factor;
                }
            }
        }
    }

    for (band, channel) in image.bands.iter_mut().zip(&channels) {
        for (out, &v) in band.iter_mut().zip(channel) {
            *out = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

/// Sigmoidal contrast adjustment on a normalized value.
fn sigmoidal(x: f64, contrast: f64, bias: f64) -> f64 {
    if contrast == 0.0 {
        return x;
    }
    let scale = |v: f64| 1.0 / (1.0 + (contrast * (bias - v)).exp());
    let numerator = scale(x) - scale(0.0);
    let denominator = scale(1.0) - scale(0.0);
    if denominator == 0.0 {
        x
    } else {
        numerator / denominator
    }
}

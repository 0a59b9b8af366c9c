//! Rescaling and color-formula post-processing.

use mosaic_common::{MosaicError, MosaicResult, Sample};

use crate::formula::{apply_formula, parse_formula};

/// A post-processed image: 8-bit bands plus the validity mask.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    /// One `u8` buffer per band, in band order.
    pub bands: Vec<Vec<u8>>,
    pub mask: Vec<bool>,
}

impl RenderedImage {
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Rescale sample values to 8 bits and apply an optional color formula.
///
/// `rescale` holds one `(min, max)` range per band; a single range is
/// broadcast to every band, and an empty slice clamps raw values into
/// 0..=255. The color formula requires three bands (r, g, b).
pub fn post_process(
    sample: &Sample,
    rescale: &[(f64, f64)],
    color_formula: Option<&str>,
) -> MosaicResult<RenderedImage> {
    let ranges = broadcast_ranges(rescale, sample.band_count())?;

    let bands: Vec<Vec<u8>> = (0..sample.band_count())
        .map(|b| {
            let range = ranges.as_ref().map(|r| r[b]);
            sample
                .band_values(b)
                .iter()
                .map(|&v| match range {
                    Some((lo, hi)) => linear_rescale(v as f64, lo, hi),
                    None => v.round().clamp(0.0, 255.0) as u8,
                })
                .collect()
        })
        .collect();

    let mut image = RenderedImage {
        width: sample.width,
        height: sample.height,
        bands,
        mask: sample.mask.clone(),
    };

    if let Some(source) = color_formula {
        let ops = parse_formula(source)?;
        apply_formula(&mut image, &ops)?;
    }

    Ok(image)
}

fn broadcast_ranges(
    rescale: &[(f64, f64)],
    band_count: usize,
) -> MosaicResult<Option<Vec<(f64, f64)>>> {
    match rescale.len() {
        0 => Ok(None),
        1 => Ok(Some(vec![rescale[0]; band_count])),
        n if n == band_count => Ok(Some(rescale.to_vec())),
        n => Err(MosaicError::render(format!(
            "{} rescale ranges for {} bands",
            n, band_count
        ))),
    }
}

/// Map `value` from `[lo, hi]` onto 0..=255, clamped.
fn linear_rescale(value: f64, lo: f64, hi: f64) -> u8 {
    if hi <= lo {
        return 0;
    }
    let scaled = (value - lo) / (hi - lo) * 255.0;
    scaled.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(bands: &[&[f32]], mask: &[bool]) -> Sample {
        let width = bands[0].len() as u32;
        Sample::new(
            width,
            1,
            (0..bands.len()).map(|i| format!("band{i}")).collect(),
            bands.concat(),
            mask.to_vec(),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_rescale_to_u8() {
        let s = sample(&[&[0.0, 0.5, 1.0, 2.0]], &[true; 4]);
        let image = post_process(&s, &[(0.0, 1.0)], None).unwrap();
        assert_eq!(image.bands[0], vec![0, 128, 255, 255]);
    }

    #[test]
    fn test_no_rescale_clamps_raw_values() {
        let s = sample(&[&[-3.0, 10.4, 300.0]], &[true; 3]);
        let image = post_process(&s, &[], None).unwrap();
        assert_eq!(image.bands[0], vec![0, 10, 255]);
    }

    #[test]
    fn test_single_range_broadcasts() {
        let s = sample(&[&[5.0], &[10.0]], &[true]);
        let image = post_process(&s, &[(0.0, 10.0)], None).unwrap();
        assert_eq!(image.bands[0], vec![128]);
        assert_eq!(image.bands[1], vec![255]);
    }

    #[test]
    fn test_mismatched_range_count_is_rejected() {
        let s = sample(&[&[1.0], &[2.0], &[3.0]], &[true]);
        let err = post_process(&s, &[(0.0, 1.0), (0.0, 1.0)], None).unwrap_err();
        assert!(matches!(err, MosaicError::Render(_)));
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(linear_rescale(5.0, 1.0, 1.0), 0);
    }

    #[test]
    fn test_mask_carried_through() {
        let s = sample(&[&[1.0, 2.0]], &[true, false]);
        let image = post_process(&s, &[], None).unwrap();
        assert_eq!(image.mask, vec![true, false]);
    }
}

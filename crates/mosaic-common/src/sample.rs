//! Decoded pixel samples with per-pixel validity masks.

use crate::{MosaicError, MosaicResult};

/// A decoded pixel buffer with a per-pixel validity mask.
///
/// Data is stored band-major: `data[band * width * height + row * width + col]`.
/// The mask is shared by all bands; a pixel is valid only where every band
/// carries data. A point sample is a 1x1 tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub width: u32,
    pub height: u32,
    /// Band names, in the order bands are stored in `data`.
    pub band_names: Vec<String>,
    /// Band-major pixel values.
    pub data: Vec<f32>,
    /// Per-pixel validity; `true` means the pixel carries data.
    pub mask: Vec<bool>,
    /// Identifiers of the asset(s) the pixels came from, in contribution order.
    pub assets: Vec<String>,
}

impl Sample {
    /// Create a sample, validating buffer dimensions.
    pub fn new(
        width: u32,
        height: u32,
        band_names: Vec<String>,
        data: Vec<f32>,
        mask: Vec<bool>,
        assets: Vec<String>,
    ) -> MosaicResult<Self> {
        let pixels = (width as usize) * (height as usize);
        if data.len() != pixels * band_names.len() {
            return Err(MosaicError::dimension_mismatch(format!(
                "expected {} values for {} bands of {}x{}, got {}",
                pixels * band_names.len(),
                band_names.len(),
                width,
                height,
                data.len()
            )));
        }
        if mask.len() != pixels {
            return Err(MosaicError::dimension_mismatch(format!(
                "expected {} mask entries for {}x{}, got {}",
                pixels,
                width,
                height,
                mask.len()
            )));
        }
        Ok(Self {
            width,
            height,
            band_names,
            data,
            mask,
            assets,
        })
    }

    /// Number of pixels per band.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.band_names.len()
    }

    /// Index of a band by name.
    pub fn band_index(&self, name: &str) -> Option<usize> {
        self.band_names.iter().position(|n| n == name)
    }

    /// Value at a pixel within a band. Panics on out-of-range indices.
    pub fn value(&self, band: usize, pixel: usize) -> f32 {
        self.data[band * self.pixel_count() + pixel]
    }

    /// One band's values as a slice.
    pub fn band_values(&self, band: usize) -> &[f32] {
        let pixels = self.pixel_count();
        &self.data[band * pixels..(band + 1) * pixels]
    }

    /// Whether every pixel is valid.
    pub fn is_fully_valid(&self) -> bool {
        self.mask.iter().all(|&v| v)
    }

    /// Whether at least one pixel is valid.
    pub fn has_valid_pixel(&self) -> bool {
        self.mask.iter().any(|&v| v)
    }

    /// Number of valid pixels.
    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&v| v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_2x1() -> Sample {
        Sample::new(
            2,
            1,
            vec!["B02".into(), "B03".into()],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true, false],
            vec!["57U".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_band_major_layout() {
        let s = sample_2x1();
        assert_eq!(s.value(0, 0), 1.0);
        assert_eq!(s.value(0, 1), 2.0);
        assert_eq!(s.value(1, 0), 3.0);
        assert_eq!(s.band_values(1), &[3.0, 4.0]);
        assert_eq!(s.band_index("B03"), Some(1));
        assert_eq!(s.band_index("B08"), None);
    }

    #[test]
    fn test_validity_queries() {
        let s = sample_2x1();
        assert!(!s.is_fully_valid());
        assert!(s.has_valid_pixel());
        assert_eq!(s.valid_count(), 1);
    }

    #[test]
    fn test_rejects_mismatched_buffers() {
        assert!(Sample::new(2, 1, vec!["B02".into()], vec![1.0], vec![true, true], vec![]).is_err());
        assert!(
            Sample::new(2, 1, vec!["B02".into()], vec![1.0, 2.0], vec![true], vec![]).is_err()
        );
    }
}

//! Pixel-selection policies and the mosaic accumulator.

use mosaic_common::{MosaicError, MosaicResult, Sample};
use serde::{Deserialize, Serialize};

/// How overlapping per-cell samples combine into one composite pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelSelection {
    /// First valid value wins; later cells only fill still-invalid pixels.
    #[default]
    First,
    /// Maximum valid value per pixel per band.
    Highest,
    /// Minimum valid value per pixel per band.
    Lowest,
    /// Mean of all valid contributions per pixel.
    Mean,
    /// Median of all valid contributions per pixel.
    Median,
    /// Population standard deviation of all valid contributions per pixel.
    StdDev,
}

impl PixelSelection {
    /// Whether the policy can stop before all candidate cells are read.
    pub fn short_circuits(&self) -> bool {
        matches!(self, PixelSelection::First)
    }
}

impl std::str::FromStr for PixelSelection {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(PixelSelection::First),
            "highest" => Ok(PixelSelection::Highest),
            "lowest" => Ok(PixelSelection::Lowest),
            "mean" => Ok(PixelSelection::Mean),
            "median" => Ok(PixelSelection::Median),
            "stddev" => Ok(PixelSelection::StdDev),
            other => Err(MosaicError::invalid_parameter(
                "pixel_selection",
                format!("unknown method '{}'", other),
            )),
        }
    }
}

/// Merges per-cell samples under one pixel-selection policy.
///
/// Sized from the first successful cell composite; every later sample must
/// match its dimensions and band set (cells are read over the same target
/// region, so a mismatch is a hard error, not a skippable one).
#[derive(Debug)]
pub struct MosaicAccumulator {
    policy: PixelSelection,
    width: u32,
    height: u32,
    band_names: Vec<String>,
    /// Working buffer for `First`/`Highest`/`Lowest`.
    data: Vec<f32>,
    /// Pixels with at least one valid contribution.
    mask: Vec<bool>,
    /// All valid contributions per band-major slot, for the statistical
    /// policies only.
    contributions: Vec<Vec<f32>>,
    assets: Vec<String>,
}

impl MosaicAccumulator {
    /// Create an empty accumulator shaped like `template`.
    pub fn new(policy: PixelSelection, template: &Sample) -> Self {
        let pixels = template.pixel_count();
        let slots = pixels * template.band_count();
        let statistical = matches!(
            policy,
            PixelSelection::Mean | PixelSelection::Median | PixelSelection::StdDev
        );
        Self {
            policy,
            width: template.width,
            height: template.height,
            band_names: template.band_names.clone(),
            data: vec![0.0; slots],
            mask: vec![false; pixels],
            contributions: if statistical {
                vec![Vec::new(); slots]
            } else {
                Vec::new()
            },
            assets: Vec::new(),
        }
    }

    /// Merge one cell's composite into the accumulator.
    pub fn push(&mut self, sample: &Sample) -> MosaicResult<()> {
        if sample.width != self.width
            || sample.height != self.height
            || sample.band_names != self.band_names
        {
            return Err(MosaicError::dimension_mismatch(format!(
                "cell composite {}x{} {:?} does not match mosaic {}x{} {:?}",
                sample.width,
                sample.height,
                sample.band_names,
                self.width,
                self.height,
                self.band_names
            )));
        }

        let pixels = sample.pixel_count();
        let bands = sample.band_count();
        let contributed = match self.policy {
            PixelSelection::First => {
                let mut filled = false;
                for px in 0..pixels {
                    if !self.mask[px] && sample.mask[px] {
                        for b in 0..bands {
                            self.data[b * pixels + px] = sample.value(b, px);
                        }
                        self.mask[px] = true;
                        filled = true;
                    }
                }
                filled
            }
            PixelSelection::Highest | PixelSelection::Lowest => {
                let keep_highest = self.policy == PixelSelection::Highest;
                for px in 0..pixels {
                    if !sample.mask[px] {
                        continue;
                    }
                    for b in 0..bands {
                        let slot = b * pixels + px;
                        let value = sample.value(b, px);
                        if !self.mask[px]
                            || (keep_highest && value > self.data[slot])
                            || (!keep_highest && value < self.data[slot])
                        {
                            self.data[slot] = value;
                        }
                    }
                    self.mask[px] = true;
                }
                sample.has_valid_pixel()
            }
            PixelSelection::Mean | PixelSelection::Median | PixelSelection::StdDev => {
                for px in 0..pixels {
                    if !sample.mask[px] {
                        continue;
                    }
                    for b in 0..bands {
                        self.contributions[b * pixels + px].push(sample.value(b, px));
                    }
                    self.mask[px] = true;
                }
                sample.has_valid_pixel()
            }
        };

        if contributed {
            self.assets.extend(sample.assets.iter().cloned());
        }
        Ok(())
    }

    /// Whether the merge can stop reading further cells.
    pub fn is_done(&self) -> bool {
        self.policy.short_circuits() && self.mask.iter().all(|&v| v)
    }

    /// Finish the merge. Returns `None` when no pixel ever became valid.
    pub fn finalize(self) -> Option<Sample> {
        if !self.mask.iter().any(|&v| v) {
            return None;
        }

        let data = match self.policy {
            PixelSelection::First | PixelSelection::Highest | PixelSelection::Lowest => self.data,
            PixelSelection::Mean => self
                .contributions
                .iter()
                .map(|values| mean(values))
                .collect(),
            PixelSelection::Median => self
                .contributions
                .iter()
                .map(|values| median(values))
                .collect(),
            PixelSelection::StdDev => self
                .contributions
                .iter()
                .map(|values| stddev(values))
                .collect(),
        };

        // Buffer shapes were checked on every push.
        Sample::new(
            self.width,
            self.height,
            self.band_names,
            data,
            self.mask,
            self.assets,
        )
        .ok()
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn stddev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f32], mask: &[bool], asset: &str) -> Sample {
        Sample::new(
            values.len() as u32,
            1,
            vec!["B02".into()],
            values.to_vec(),
            mask.to_vec(),
            vec![asset.into()],
        )
        .unwrap()
    }

    #[test]
    fn test_first_fills_only_invalid_pixels() {
        let a = sample(&[1.0, 2.0, 3.0], &[true, false, true], "a");
        let b = sample(&[9.0, 9.0, 9.0], &[true, true, true], "b");

        let mut acc = MosaicAccumulator::new(PixelSelection::First, &a);
        acc.push(&a).unwrap();
        assert!(!acc.is_done());
        acc.push(&b).unwrap();
        assert!(acc.is_done());

        let merged = acc.finalize().unwrap();
        assert_eq!(merged.data, vec![1.0, 9.0, 3.0]);
        assert_eq!(merged.assets, vec!["a", "b"]);
    }

    #[test]
    fn test_first_skips_non_contributing_cell() {
        let a = sample(&[1.0, 2.0], &[true, true], "a");
        let b = sample(&[9.0, 9.0], &[true, true], "b");

        let mut acc = MosaicAccumulator::new(PixelSelection::First, &a);
        acc.push(&a).unwrap();
        acc.push(&b).unwrap();

        // b filled nothing, so it is not listed as a contributor.
        let merged = acc.finalize().unwrap();
        assert_eq!(merged.assets, vec!["a"]);
    }

    #[test]
    fn test_first_partial_exhaustion_keeps_masked_pixels() {
        let a = sample(&[1.0, 2.0], &[true, false], "a");

        let mut acc = MosaicAccumulator::new(PixelSelection::First, &a);
        acc.push(&a).unwrap();
        assert!(!acc.is_done());

        let merged = acc.finalize().unwrap();
        assert_eq!(merged.mask, vec![true, false]);
        assert_eq!(merged.valid_count(), 1);
    }

    #[test]
    fn test_highest_and_lowest() {
        let a = sample(&[1.0, 5.0], &[true, true], "a");
        let b = sample(&[3.0, 2.0], &[true, true], "b");

        let mut acc = MosaicAccumulator::new(PixelSelection::Highest, &a);
        acc.push(&a).unwrap();
        acc.push(&b).unwrap();
        assert!(!acc.is_done());
        assert_eq!(acc.finalize().unwrap().data, vec![3.0, 5.0]);

        let mut acc = MosaicAccumulator::new(PixelSelection::Lowest, &a);
        acc.push(&a).unwrap();
        acc.push(&b).unwrap();
        assert_eq!(acc.finalize().unwrap().data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_statistics() {
        let a = sample(&[2.0, 1.0], &[true, true], "a");
        let b = sample(&[4.0, 5.0], &[true, false], "b");
        let c = sample(&[6.0, 9.0], &[true, false], "c");

        let mut acc = MosaicAccumulator::new(PixelSelection::Mean, &a);
        for s in [&a, &b, &c] {
            acc.push(s).unwrap();
            assert!(!acc.is_done());
        }
        let merged = acc.finalize().unwrap();
        assert_eq!(merged.data, vec![4.0, 1.0]);

        let mut acc = MosaicAccumulator::new(PixelSelection::Median, &a);
        for s in [&a, &b, &c] {
            acc.push(s).unwrap();
        }
        assert_eq!(acc.finalize().unwrap().data, vec![4.0, 1.0]);

        let mut acc = MosaicAccumulator::new(PixelSelection::StdDev, &a);
        for s in [&a, &b, &c] {
            acc.push(s).unwrap();
        }
        // Population stddev of {2,4,6} and of the single value {1}.
        let merged = acc.finalize().unwrap();
        assert!((merged.data[0] - (8.0f32 / 3.0).sqrt()).abs() < 1e-6);
        assert_eq!(merged.data[1], 0.0);
    }

    #[test]
    fn test_pixel_with_no_contributions_stays_invalid() {
        let a = sample(&[2.0, 0.0], &[true, false], "a");
        let b = sample(&[4.0, 0.0], &[true, false], "b");

        let mut acc = MosaicAccumulator::new(PixelSelection::Mean, &a);
        acc.push(&a).unwrap();
        acc.push(&b).unwrap();

        let merged = acc.finalize().unwrap();
        assert_eq!(merged.mask, vec![true, false]);
    }

    #[test]
    fn test_all_invalid_finalizes_to_none() {
        let a = sample(&[0.0], &[false], "a");
        let mut acc = MosaicAccumulator::new(PixelSelection::First, &a);
        acc.push(&a).unwrap();
        assert!(acc.finalize().is_none());
    }

    #[test]
    fn test_dimension_mismatch_is_hard_error() {
        let a = sample(&[1.0, 2.0], &[true, true], "a");
        let b = sample(&[1.0], &[true], "b");

        let mut acc = MosaicAccumulator::new(PixelSelection::First, &a);
        acc.push(&a).unwrap();
        let err = acc.push(&b).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_policy_parsing() {
        use std::str::FromStr;
        assert_eq!(
            PixelSelection::from_str("median").unwrap(),
            PixelSelection::Median
        );
        assert_eq!(
            PixelSelection::from_str("stddev").unwrap(),
            PixelSelection::StdDev
        );
        assert!(PixelSelection::from_str("latest").is_err());
    }
}

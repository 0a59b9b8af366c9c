//! Per-cell multi-band compositing.

use std::sync::Arc;

use band_reader::{AssetLocator, BandSource, RasterReader, ReadOptions};
use futures::future::try_join_all;
use mosaic_common::{Band, DateKey, MosaicError, MosaicResult, Sample, TileCoord};
use tracing::debug;

use crate::expression::{parse_expressions, NamedExpression};
use crate::request::BandSelection;

/// Target region of one composite read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Tile { coord: TileCoord, tilesize: u32 },
    Point { lon: f64, lat: f64 },
}

/// Resolved band selection: which assets to read, and which derived bands
/// to evaluate from them.
///
/// Resolution is pure and happens before any I/O, so invalid band names and
/// malformed expressions are rejected without a network round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPlan {
    /// Input bands to read, in output (or expression-appearance) order.
    pub bands: Vec<Band>,
    /// Derived output bands, when the request carried an expression.
    pub expressions: Option<Vec<NamedExpression>>,
}

impl BandPlan {
    pub fn resolve(selection: &BandSelection) -> MosaicResult<Self> {
        match selection {
            BandSelection::Bands(names) => {
                if names.is_empty() {
                    return Err(MosaicError::invalid_parameter(
                        "bands",
                        "at least one band is required",
                    ));
                }
                let mut bands = Vec::with_capacity(names.len());
                for name in names {
                    let band = Band::parse(name)?;
                    if !bands.contains(&band) {
                        bands.push(band);
                    }
                }
                Ok(Self {
                    bands,
                    expressions: None,
                })
            }
            BandSelection::Expression(source) => {
                let expressions = parse_expressions(source)?;
                let mut bands = Vec::new();
                for expr in &expressions {
                    for band in expr.required_bands() {
                        if !bands.contains(&band) {
                            bands.push(band);
                        }
                    }
                }
                Ok(Self {
                    bands,
                    expressions: Some(expressions),
                })
            }
        }
    }
}

/// Reads and assembles all requested bands for one grid cell.
#[derive(Clone)]
pub struct CellCompositor {
    reader: Arc<dyn RasterReader>,
    locator: AssetLocator,
}

impl CellCompositor {
    pub fn new(reader: Arc<dyn RasterReader>, locator: AssetLocator) -> Self {
        Self { reader, locator }
    }

    /// Composite one cell over the target region.
    ///
    /// Per-band reads run concurrently and all join before the result is
    /// assembled; a recoverable failure on any band fails the whole cell
    /// with the same kind, since bands must align pixel-for-pixel.
    pub async fn composite(
        &self,
        cell_id: &str,
        date: &DateKey,
        plan: &BandPlan,
        region: Region,
        options: &ReadOptions,
    ) -> MosaicResult<Sample> {
        let reads = plan
            .bands
            .iter()
            .map(|&band| self.read_band(cell_id, date, band, region, options));
        let band_samples = try_join_all(reads).await?;

        let sample = join_bands(cell_id, band_samples)?;
        match &plan.expressions {
            Some(expressions) => apply_expressions(sample, expressions),
            None => Ok(sample),
        }
    }

    /// Read one band of one cell. The band source is scoped to this call
    /// and released on every exit path.
    async fn read_band(
        &self,
        cell_id: &str,
        date: &DateKey,
        band: Band,
        region: Region,
        options: &ReadOptions,
    ) -> MosaicResult<Sample> {
        let locator = self.locator.locate(cell_id, date, band);
        let source = BandSource::open(self.reader.as_ref(), locator, options.clone()).await?;

        let mut sample = match region {
            Region::Tile { coord, tilesize } => source.read_tile(coord, tilesize).await?,
            Region::Point { lon, lat } => source.read_point(lon, lat).await?,
        };

        if sample.band_count() != 1 {
            return Err(MosaicError::dimension_mismatch(format!(
                "asset {} returned {} bands, expected 1",
                source.locator(),
                sample.band_count()
            )));
        }
        sample.band_names = vec![band.name().to_string()];
        debug!(cell = %cell_id, band = %band, valid = sample.valid_count(), "read band");
        Ok(sample)
    }
}

/// Stack single-band samples into one multi-band sample.
///
/// The joint mask is the conjunction of the per-band masks: a composite
/// pixel is only usable where every band carries data.
fn join_bands(cell_id: &str, band_samples: Vec<Sample>) -> MosaicResult<Sample> {
    let first = band_samples
        .first()
        .ok_or_else(|| MosaicError::invalid_parameter("bands", "at least one band is required"))?;
    let (width, height) = (first.width, first.height);
    let pixels = first.pixel_count();

    let mut band_names = Vec::with_capacity(band_samples.len());
    let mut data = Vec::with_capacity(pixels * band_samples.len());
    let mut mask = vec![true; pixels];

    for sample in &band_samples {
        if sample.width != width || sample.height != height {
            return Err(MosaicError::dimension_mismatch(format!(
                "cell '{}': band {} is {}x{}, expected {}x{}",
                cell_id, sample.band_names[0], sample.width, sample.height, width, height
            )));
        }
        band_names.push(sample.band_names[0].clone());
        data.extend_from_slice(&sample.data);
        for (joint, &valid) in mask.iter_mut().zip(&sample.mask) {
            *joint &= valid;
        }
    }

    Sample::new(
        width,
        height,
        band_names,
        data,
        mask,
        vec![cell_id.to_string()],
    )
}

/// Evaluate derived bands per pixel, replacing the input bands.
///
/// Non-finite results (e.g. division by zero) are masked out rather than
/// surfaced as data.
fn apply_expressions(
    sample: Sample,
    expressions: &[NamedExpression],
) -> MosaicResult<Sample> {
    let pixels = sample.pixel_count();
    let mut band_names = Vec::with_capacity(expressions.len());
    let mut data = Vec::with_capacity(pixels * expressions.len());
    let mut mask = sample.mask.clone();

    for expr in expressions {
        band_names.push(expr.name.clone());
        for px in 0..pixels {
            if !sample.mask[px] {
                data.push(0.0);
                continue;
            }
            let value_of = |band: Band| {
                sample
                    .band_index(band.name())
                    .map(|b| sample.value(b, px) as f64)
                    .unwrap_or(f64::NAN)
            };
            let value = expr.evaluate(&value_of);
            if value.is_finite() {
                data.push(value as f32);
            } else {
                data.push(0.0);
                mask[px] = false;
            }
        }
    }

    Sample::new(
        sample.width,
        sample.height,
        band_names,
        data,
        mask,
        sample.assets,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_band_names() {
        let plan = BandPlan::resolve(&BandSelection::bands(["B02", "B3", "B02"])).unwrap();
        assert_eq!(plan.bands, vec![Band::B02, Band::B03]);
        assert!(plan.expressions.is_none());
    }

    #[test]
    fn test_plan_from_expression() {
        let plan =
            BandPlan::resolve(&BandSelection::expression("(B08-B04)/(B08+B04)")).unwrap();
        assert_eq!(plan.bands, vec![Band::B08, Band::B04]);
        assert_eq!(plan.expressions.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_plan_rejects_invalid_input() {
        assert!(BandPlan::resolve(&BandSelection::bands(Vec::<String>::new())).is_err());
        assert!(matches!(
            BandPlan::resolve(&BandSelection::bands(["B99"])).unwrap_err(),
            MosaicError::InvalidBandName { .. }
        ));
        assert!(matches!(
            BandPlan::resolve(&BandSelection::expression("B08+")).unwrap_err(),
            MosaicError::Expression(_)
        ));
    }

    #[test]
    fn test_join_bands_conjoins_masks() {
        let b02 = Sample::new(
            2,
            1,
            vec!["B02".into()],
            vec![1.0, 2.0],
            vec![true, true],
            vec![],
        )
        .unwrap();
        let b03 = Sample::new(
            2,
            1,
            vec!["B03".into()],
            vec![3.0, 4.0],
            vec![true, false],
            vec![],
        )
        .unwrap();

        let joined = join_bands("57U", vec![b02, b03]).unwrap();
        assert_eq!(joined.band_names, vec!["B02", "B03"]);
        assert_eq!(joined.mask, vec![true, false]);
        assert_eq!(joined.assets, vec!["57U"]);
        assert_eq!(joined.value(1, 0), 3.0);
    }

    #[test]
    fn test_expression_masks_division_by_zero() {
        let sample = Sample::new(
            2,
            1,
            vec!["B08".into(), "B04".into()],
            vec![6.0, 6.0, 2.0, 0.0],
            vec![true, true],
            vec!["57U".into()],
        )
        .unwrap();
        let expressions = parse_expressions("B08/B04").unwrap();

        let derived = apply_expressions(sample, &expressions).unwrap();
        assert_eq!(derived.band_names, vec!["B08/B04"]);
        assert_eq!(derived.value(0, 0), 3.0);
        assert_eq!(derived.mask, vec![true, false]);
    }
}

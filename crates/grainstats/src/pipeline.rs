//! Grain statistics aggregation.
//!
//! Every labelled region of an image is measured independently: boundary,
//! convex hull, minimum bounding rectangle, radii about the boundary centroid,
//! feret diameters and masked height statistics. A region that cannot be
//! measured is recorded as skipped and never aborts the run.

use crate::plot_data::{GrainPlotData, PlotArray, PlotName};
use crate::record::{GrainRecord, GrainStatsTable, SkippedGrain};
use crate::{Direction, GrainStatsError, GrainStatsParams, SkipReason};
use grainstats_core::{
    boundary_centroid, crop_centred, extract_boundary, graham_scan, label_regions, median,
    minimum_bounding_rectangle, radius_stats, CaliperFeret, FeretAxisProfile, FeretMeasure,
    HeightMap, HeightMapView, HeightProfiler, LabelMapView, Mask, Raster, Region,
};
use log::{debug, warn};
use nalgebra::Point2;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// One image, its labels and how it was thresholded.
#[derive(Clone, Copy, Debug)]
pub struct GrainStatsInput<'a> {
    pub image: HeightMapView<'a>,
    /// `None` when segmentation found nothing.
    pub labels: Option<LabelMapView<'a>>,
    pub direction: Direction,
    pub image_name: &'a str,
}

/// Everything produced for one (image, direction) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct GrainStatsOutput {
    pub table: GrainStatsTable,
    /// Three descriptors per measured grain, in grain order.
    pub plot_data: Vec<GrainPlotData>,
    /// Keyed by grain number; filled only when profiles are requested.
    pub height_profiles: BTreeMap<usize, Vec<f64>>,
    pub skipped: Vec<SkippedGrain>,
}

impl GrainStatsOutput {
    pub fn empty(image_name: &str, direction: Direction) -> Self {
        Self {
            table: GrainStatsTable::empty(image_name, direction),
            plot_data: Vec::new(),
            height_profiles: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }
}

struct MeasuredGrain {
    record: GrainRecord,
    plot_data: Vec<GrainPlotData>,
    height_profile: Option<Vec<f64>>,
}

struct GrainContext<'a> {
    image: HeightMapView<'a>,
    labels: LabelMapView<'a>,
    image_name: &'a str,
    direction: Direction,
    output_dir: PathBuf,
}

#[derive(Debug, PartialEq)]
struct HeightStats {
    min: f64,
    max: f64,
    mean: f64,
    median: f64,
    sum: f64,
}

/// NaN-ignoring statistics; all `NaN` (and a zero sum) when nothing is left.
fn height_stats(values: &[f64]) -> HeightStats {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return HeightStats {
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            median: f64::NAN,
            sum: 0.0,
        };
    }
    let sum: f64 = finite.iter().sum();
    HeightStats {
        min: finite.iter().copied().fold(f64::INFINITY, f64::min),
        max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: sum / finite.len() as f64,
        median: median(&finite).unwrap_or(f64::NAN),
        sum,
    }
}

/// `image` where `mask` is set, `NaN` elsewhere.
fn masked(image: &HeightMap, mask: &Mask) -> HeightMap {
    Raster {
        width: image.width,
        height: image.height,
        data: image
            .data
            .iter()
            .zip(&mask.data)
            .map(|(&v, &m)| if m { v } else { f64::NAN })
            .collect(),
    }
}

/// Per-grain statistics over labelled height maps.
///
/// Feret diameters and height profiles are pluggable; the defaults are
/// [`CaliperFeret`] and [`FeretAxisProfile`].
#[derive(Clone, Debug)]
pub struct GrainStats<F = CaliperFeret, H = FeretAxisProfile> {
    params: GrainStatsParams,
    feret: F,
    profiler: H,
}

impl GrainStats {
    pub fn new(params: GrainStatsParams) -> Result<Self, GrainStatsError> {
        params.validate()?;
        Ok(Self {
            params,
            feret: CaliperFeret,
            profiler: FeretAxisProfile,
        })
    }
}

impl<F: FeretMeasure, H: HeightProfiler> GrainStats<F, H> {
    pub fn with_feret<G: FeretMeasure>(self, feret: G) -> GrainStats<G, H> {
        GrainStats {
            params: self.params,
            feret,
            profiler: self.profiler,
        }
    }

    pub fn with_profiler<P: HeightProfiler>(self, profiler: P) -> GrainStats<F, P> {
        GrainStats {
            params: self.params,
            feret: self.feret,
            profiler,
        }
    }

    #[inline]
    pub fn params(&self) -> &GrainStatsParams {
        &self.params
    }

    /// Measure every labelled region of `input`.
    ///
    /// Grain numbers are positions in ascending label order, counted before
    /// any grain is skipped. Without labels the result is an empty table.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, input), fields(image = input.image_name, direction = %input.direction))
    )]
    pub fn calculate_stats(
        &self,
        input: &GrainStatsInput<'_>,
    ) -> Result<GrainStatsOutput, GrainStatsError> {
        let Some(labels) = input.labels else {
            warn!(
                "[{}] : no labelled regions for direction {}; returning an empty table",
                input.image_name, input.direction
            );
            return Ok(GrainStatsOutput::empty(input.image_name, input.direction));
        };

        let image_shape = (input.image.height, input.image.width);
        let label_shape = (labels.height, labels.width);
        if image_shape != label_shape {
            return Err(GrainStatsError::ShapeMismatch {
                image: image_shape,
                labels: label_shape,
            });
        }

        let regions = label_regions(&labels);
        debug!("[{}] : {} labelled regions", input.image_name, regions.len());

        let ctx = GrainContext {
            image: input.image,
            labels,
            image_name: input.image_name,
            direction: input.direction,
            output_dir: self.params.base_output_dir.join(input.direction.as_str()),
        };

        #[cfg(feature = "rayon")]
        let outcomes: Vec<Result<MeasuredGrain, SkipReason>> = regions
            .par_iter()
            .enumerate()
            .map(|(n, region)| self.measure_grain(&ctx, n, region))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let outcomes: Vec<Result<MeasuredGrain, SkipReason>> = regions
            .iter()
            .enumerate()
            .map(|(n, region)| self.measure_grain(&ctx, n, region))
            .collect();

        let mut out = GrainStatsOutput::empty(input.image_name, input.direction);
        for ((grain_number, region), outcome) in regions.iter().enumerate().zip(outcomes) {
            match outcome {
                Ok(grain) => {
                    out.table.rows.push(grain.record);
                    out.plot_data.extend(grain.plot_data);
                    if let Some(profile) = grain.height_profile {
                        out.height_profiles.insert(grain_number, profile);
                    }
                }
                Err(reason) => {
                    debug!(
                        "[{}] : skipping grain {grain_number} (label {}, bbox {}x{}): {reason}",
                        input.image_name,
                        region.label,
                        region.bbox.height(),
                        region.bbox.width()
                    );
                    out.skipped.push(SkippedGrain {
                        grain_number,
                        label: region.label,
                        reason,
                    });
                }
            }
        }

        debug!(
            "[{}] : measured {} grains, skipped {}",
            input.image_name,
            out.table.len(),
            out.skipped.len()
        );
        Ok(out)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(grain = grain_number, label = region.label))
    )]
    fn measure_grain(
        &self,
        ctx: &GrainContext<'_>,
        grain_number: usize,
        region: &Region,
    ) -> Result<MeasuredGrain, SkipReason> {
        let p = &self.params;
        let bbox = region.bbox;
        if bbox.min_side() < p.min_bbox_side_px {
            return Err(SkipReason::TooSmall);
        }

        let grain_image = ctx
            .image
            .crop(bbox.min_row, bbox.min_col, bbox.max_row, bbox.max_col);
        let grain_mask = &region.mask;
        let grain_mask_image = masked(&grain_image, grain_mask);

        let edges = extract_boundary(grain_mask, p.edge_detection_method);
        if edges.is_empty() {
            return Err(SkipReason::EmptyBoundary);
        }
        let hull = graham_scan(&edges)?;
        let rect = minimum_bounding_rectangle(&edges, &hull.simplices)?;
        let radius = radius_stats(&edges).ok_or(SkipReason::EmptyBoundary)?;
        let centroid = boundary_centroid(&edges).ok_or(SkipReason::EmptyBoundary)?;

        let length = p.length_scaling_factor();
        let area = p.area_scaling_factor();

        // Centroid is local to the bounding box; the row mean takes the column
        // offset and the column mean the row offset.
        let centre = Point2::new(
            centroid.x + bbox.min_col as f64,
            centroid.y + bbox.min_row as f64,
        ) * length;

        let feret = self
            .feret
            .min_max_feret(&grain_mask.points())
            .scaled(length);
        let heights = height_stats(&grain_mask_image.data);

        let height_profile = p
            .extract_height_profile
            .then(|| self.profiler.profile(&grain_image.view(), grain_mask));

        let record = GrainRecord {
            grain_number,
            centre_x: centre.x,
            centre_y: centre.y,
            radius_min: radius.min * length,
            radius_max: radius.max * length,
            radius_mean: radius.mean * length,
            radius_median: radius.median * length,
            height_min: heights.min * p.metre_scaling_factor,
            height_max: heights.max * p.metre_scaling_factor,
            height_median: heights.median * p.metre_scaling_factor,
            height_mean: heights.mean * p.metre_scaling_factor,
            volume: heights.sum * p.volume_scaling_factor(),
            area: region.area as f64 * area,
            area_cartesian_bbox: bbox.area() as f64 * area,
            smallest_bounding_width: rect.width * length,
            smallest_bounding_length: rect.length * length,
            smallest_bounding_area: rect.width * rect.length * area,
            aspect_ratio: rect.aspect_ratio,
            threshold: ctx.direction,
            max_feret: feret.max_feret,
            min_feret: feret.min_feret,
            image: ctx.image_name.to_string(),
        };

        let plot_data = self.plot_data(ctx, grain_number, region, grain_image, grain_mask_image);

        Ok(MeasuredGrain {
            record,
            plot_data,
            height_profile,
        })
    }

    fn plot_data(
        &self,
        ctx: &GrainContext<'_>,
        grain_number: usize,
        region: &Region,
        grain_image: HeightMap,
        grain_mask_image: HeightMap,
    ) -> Vec<GrainPlotData> {
        let (image, mask, mask_image) = match self.params.crop_half_side() {
            None => (grain_image, region.mask.clone(), grain_mask_image),
            Some(half) => {
                let centre = region.bbox.centre();
                let image = crop_centred(&ctx.image, centre, half);
                let labels = crop_centred(&ctx.labels, centre, half);
                let mask = Raster {
                    width: labels.width,
                    height: labels.height,
                    data: labels.data.iter().map(|&l| l == region.label).collect(),
                };
                let mask_image = masked(&image, &mask);
                (image, mask, mask_image)
            }
        };

        PlotName::ALL
            .into_iter()
            .map(|name| {
                let data = match name {
                    PlotName::GrainImage => PlotArray::Image(image.clone()),
                    PlotName::GrainMask => PlotArray::Mask(mask.clone()),
                    PlotName::GrainMaskImage => PlotArray::Image(mask_image.clone()),
                };
                GrainPlotData::new(
                    data,
                    ctx.output_dir.clone(),
                    ctx.image_name,
                    name,
                    grain_number,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grainstats_core::LabelMap;

    fn blob_labels() -> LabelMap {
        let mut labels = LabelMap::filled(20, 18, 0);
        for r in 1..7 {
            for c in 1..8 {
                labels.set(r, c, 1);
            }
        }
        for r in 9..16 {
            for c in 6..13 {
                if (r as i32 - 12).abs() + (c as i32 - 9).abs() <= 3 {
                    labels.set(r, c, 2);
                }
            }
        }
        labels.set(17, 18, 3);
        labels
    }

    fn ramp(width: usize, height: usize) -> HeightMap {
        Raster {
            width,
            height,
            data: (0..width * height).map(|i| (i % 7) as f64).collect(),
        }
    }

    #[test]
    fn ordered_map_matches_per_grain_measurement() {
        let labels = blob_labels();
        let image = ramp(20, 18);
        let input = GrainStatsInput {
            image: image.view(),
            labels: Some(labels.view()),
            direction: Direction::Above,
            image_name: "blobs",
        };
        let stats = GrainStats::new(GrainStatsParams::default()).unwrap();
        let out = stats.calculate_stats(&input).unwrap();

        let ctx = GrainContext {
            image: image.view(),
            labels: labels.view(),
            image_name: "blobs",
            direction: Direction::Above,
            output_dir: PathBuf::from("grains/above"),
        };
        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        for (n, region) in label_regions(&labels.view()).iter().enumerate() {
            match stats.measure_grain(&ctx, n, region) {
                Ok(g) => rows.push(g.record),
                Err(reason) => skipped.push((n, reason)),
            }
        }
        assert_eq!(out.table.rows, rows);
        assert_eq!(
            out.skipped
                .iter()
                .map(|s| (s.grain_number, s.reason))
                .collect::<Vec<_>>(),
            skipped
        );
        assert_eq!(out.plot_data.len(), 3 * rows.len());
    }

    #[test]
    fn grain_numbers_count_skipped_regions() {
        let labels = blob_labels();
        let image = ramp(20, 18);
        let input = GrainStatsInput {
            image: image.view(),
            labels: Some(labels.view()),
            direction: Direction::Below,
            image_name: "blobs",
        };
        let out = GrainStats::new(GrainStatsParams::default())
            .unwrap()
            .calculate_stats(&input)
            .unwrap();
        let numbers: Vec<usize> = out.table.rows.iter().map(|r| r.grain_number).collect();
        assert_eq!(numbers, vec![0, 1]);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].grain_number, 2);
        assert_eq!(out.skipped[0].label, 3);
        assert_eq!(out.skipped[0].reason, SkipReason::TooSmall);
        assert!(out
            .plot_data
            .iter()
            .all(|d| d.output_dir == PathBuf::from("grains/below")));
    }

    #[test]
    fn height_stats_ignore_nan() {
        let s = height_stats(&[f64::NAN, 1.0, 3.0, f64::NAN, 2.0, 6.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 6.0);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.sum, 12.0);

        let none = height_stats(&[f64::NAN]);
        assert!(none.min.is_nan() && none.mean.is_nan());
        assert_eq!(none.sum, 0.0);
    }

    #[test]
    fn masked_blanks_background() {
        let img = Raster::from_rows(&[vec![1.0, 2.0]]);
        let mask = Raster::from_rows(&[vec![false, true]]);
        let m = masked(&img, &mask);
        assert!(m.data[0].is_nan());
        assert_eq!(m.data[1], 2.0);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let labels = LabelMap::filled(4, 4, 1);
        let image = HeightMap::filled(5, 4, 0.0);
        let input = GrainStatsInput {
            image: image.view(),
            labels: Some(labels.view()),
            direction: Direction::Above,
            image_name: "bad",
        };
        let err = GrainStats::new(GrainStatsParams::default())
            .unwrap()
            .calculate_stats(&input)
            .unwrap_err();
        assert_eq!(
            err,
            GrainStatsError::ShapeMismatch {
                image: (4, 5),
                labels: (4, 4)
            }
        );
    }
}

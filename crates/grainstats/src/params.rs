use crate::GrainStatsError;
use grainstats_core::BoundaryMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which side of the threshold the grains were segmented from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Above,
    Below,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for the grain statistics aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainStatsParams {
    /// Physical size of one pixel, in nanometres.
    pub pixel_to_nanometre_scaling: f64,
    /// Multiplier taking nanometres to the output unit (metres by default).
    pub metre_scaling_factor: f64,
    pub edge_detection_method: BoundaryMethod,
    /// Sample a height profile along each grain's longest axis.
    pub extract_height_profile: bool,
    /// Side of the square plot crop, in nanometres. Negative disables cropping
    /// and uses the grain's bounding box instead.
    pub cropped_size: f64,
    /// Grains whose bounding box has a side shorter than this are skipped.
    pub min_bbox_side_px: usize,
    /// Root of the plot output tree; plots land in `base_output_dir/<direction>`.
    pub base_output_dir: PathBuf,
}

impl Default for GrainStatsParams {
    fn default() -> Self {
        Self {
            pixel_to_nanometre_scaling: 1.0,
            metre_scaling_factor: 1e-9,
            edge_detection_method: BoundaryMethod::BinaryErosion,
            extract_height_profile: false,
            cropped_size: -1.0,
            min_bbox_side_px: 5,
            base_output_dir: PathBuf::from("grains"),
        }
    }
}

impl GrainStatsParams {
    /// Linear pixel-to-output factor.
    #[inline]
    pub fn length_scaling_factor(&self) -> f64 {
        self.pixel_to_nanometre_scaling * self.metre_scaling_factor
    }

    #[inline]
    pub fn area_scaling_factor(&self) -> f64 {
        self.length_scaling_factor().powi(2)
    }

    /// Factor applied to a summed height (px · px · nm) to get a volume.
    #[inline]
    pub fn volume_scaling_factor(&self) -> f64 {
        self.pixel_to_nanometre_scaling.powi(2) * self.metre_scaling_factor.powi(3)
    }

    /// Half side, in pixels, of the square plot crop; `None` when cropping is off.
    pub fn crop_half_side(&self) -> Option<usize> {
        if self.cropped_size < 0.0 {
            return None;
        }
        Some((self.cropped_size / (2.0 * self.pixel_to_nanometre_scaling)).floor() as usize)
    }

    pub fn validate(&self) -> Result<(), GrainStatsError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.pixel_to_nanometre_scaling) {
            return Err(GrainStatsError::InvalidParams(format!(
                "pixel_to_nanometre_scaling must be positive, got {}",
                self.pixel_to_nanometre_scaling
            )));
        }
        if !positive(self.metre_scaling_factor) {
            return Err(GrainStatsError::InvalidParams(format!(
                "metre_scaling_factor must be positive, got {}",
                self.metre_scaling_factor
            )));
        }
        if !self.cropped_size.is_finite() {
            return Err(GrainStatsError::InvalidParams(format!(
                "cropped_size must be finite, got {}",
                self.cropped_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_documented_values() {
        let p = GrainStatsParams::default();
        assert_eq!(p.pixel_to_nanometre_scaling, 1.0);
        assert_eq!(p.metre_scaling_factor, 1e-9);
        assert_eq!(p.edge_detection_method, BoundaryMethod::BinaryErosion);
        assert!(!p.extract_height_profile);
        assert_eq!(p.crop_half_side(), None);
        assert_eq!(p.min_bbox_side_px, 5);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn scaling_factors() {
        let p = GrainStatsParams {
            pixel_to_nanometre_scaling: 2.0,
            ..GrainStatsParams::default()
        };
        assert_relative_eq!(p.length_scaling_factor(), 2e-9);
        assert_relative_eq!(p.area_scaling_factor(), 4e-18);
        assert_relative_eq!(p.volume_scaling_factor(), 4e-27);
    }

    #[test]
    fn crop_half_side_uses_pixel_size() {
        let p = GrainStatsParams {
            pixel_to_nanometre_scaling: 0.5,
            cropped_size: 10.0,
            ..GrainStatsParams::default()
        };
        assert_eq!(p.crop_half_side(), Some(10));
    }

    #[test]
    fn rejects_non_positive_scaling() {
        let p = GrainStatsParams {
            pixel_to_nanometre_scaling: 0.0,
            ..GrainStatsParams::default()
        };
        assert!(matches!(p.validate(), Err(GrainStatsError::InvalidParams(_))));
    }

    #[test]
    fn rejects_non_finite_crop() {
        for cropped_size in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let p = GrainStatsParams {
                cropped_size,
                ..GrainStatsParams::default()
            };
            assert!(matches!(p.validate(), Err(GrainStatsError::InvalidParams(_))));
        }
        let huge = GrainStatsParams {
            cropped_size: 1e300,
            ..GrainStatsParams::default()
        };
        assert!(huge.validate().is_ok());
        assert_eq!(huge.crop_half_side(), Some(usize::MAX));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: GrainStatsParams =
            serde_json::from_str(r#"{ "edge_detection_method": "canny", "cropped_size": 40.0 }"#)
                .unwrap();
        assert_eq!(p.edge_detection_method, BoundaryMethod::Canny);
        assert_eq!(p.cropped_size, 40.0);
        assert_eq!(p.metre_scaling_factor, 1e-9);
        assert_eq!(Direction::Below.to_string(), "below");
    }
}

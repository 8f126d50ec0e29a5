//! Result rows and the per-(image, direction) table.

use crate::{Direction, SkipReason};
use serde::{Deserialize, Deserializer, Serialize};

/// Column order of a grain statistics table.
pub const GRAIN_STATS_COLUMNS: [&str; 22] = [
    "grain_number",
    "centre_x",
    "centre_y",
    "radius_min",
    "radius_max",
    "radius_mean",
    "radius_median",
    "height_min",
    "height_max",
    "height_median",
    "height_mean",
    "volume",
    "area",
    "area_cartesian_bbox",
    "smallest_bounding_width",
    "smallest_bounding_length",
    "smallest_bounding_area",
    "aspect_ratio",
    "threshold",
    "max_feret",
    "min_feret",
    "image",
];

// JSON has no NaN; serde_json writes it as `null`, so read `null` back as NaN.
fn f64_or_nan<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(de)?.unwrap_or(f64::NAN))
}

pub(crate) fn vec_f64_or_nan<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<f64>, D::Error> {
    Ok(Vec::<Option<f64>>::deserialize(de)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Statistics of one grain, in output units.
///
/// Lengths are pixels × `pixel_to_nanometre_scaling` × `metre_scaling_factor`,
/// areas the square of that, heights × `metre_scaling_factor`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrainRecord {
    pub grain_number: usize,
    pub centre_x: f64,
    pub centre_y: f64,
    pub radius_min: f64,
    pub radius_max: f64,
    pub radius_mean: f64,
    pub radius_median: f64,
    #[serde(deserialize_with = "f64_or_nan")]
    pub height_min: f64,
    #[serde(deserialize_with = "f64_or_nan")]
    pub height_max: f64,
    #[serde(deserialize_with = "f64_or_nan")]
    pub height_median: f64,
    #[serde(deserialize_with = "f64_or_nan")]
    pub height_mean: f64,
    pub volume: f64,
    pub area: f64,
    pub area_cartesian_bbox: f64,
    pub smallest_bounding_width: f64,
    pub smallest_bounding_length: f64,
    pub smallest_bounding_area: f64,
    /// `NaN` when the bounding rectangle has zero size.
    #[serde(deserialize_with = "f64_or_nan")]
    pub aspect_ratio: f64,
    pub threshold: Direction,
    pub max_feret: f64,
    pub min_feret: f64,
    pub image: String,
}

/// A grain that was seen but not measured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedGrain {
    pub grain_number: usize,
    pub label: u32,
    pub reason: SkipReason,
}

/// All grain records for one image and threshold direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrainStatsTable {
    pub image: String,
    pub direction: Direction,
    pub rows: Vec<GrainRecord>,
}

impl GrainStatsTable {
    pub fn empty(image: impl Into<String>, direction: Direction) -> Self {
        Self {
            image: image.into(),
            direction,
            rows: Vec::new(),
        }
    }

    /// Column names; present even when there are no rows.
    pub fn columns(&self) -> &'static [&'static str] {
        &GRAIN_STATS_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, grain_number: usize) -> Option<&GrainRecord> {
        self.rows.iter().find(|r| r.grain_number == grain_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GrainRecord {
        GrainRecord {
            grain_number: 3,
            centre_x: 1.0,
            centre_y: 2.0,
            radius_min: 0.5,
            radius_max: 1.5,
            radius_mean: 1.0,
            radius_median: 1.0,
            height_min: f64::NAN,
            height_max: 4.0,
            height_median: 2.0,
            height_mean: 2.0,
            volume: 8.0,
            area: 4.0,
            area_cartesian_bbox: 9.0,
            smallest_bounding_width: 2.0,
            smallest_bounding_length: 3.0,
            smallest_bounding_area: 6.0,
            aspect_ratio: f64::NAN,
            threshold: Direction::Below,
            max_feret: 3.5,
            min_feret: 2.0,
            image: "scan".to_string(),
        }
    }

    #[test]
    fn serialised_fields_follow_column_order() {
        let json = serde_json::to_string(&record()).unwrap();
        let positions: Vec<usize> = GRAIN_STATS_COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{c}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        let keys = serde_json::to_value(record()).unwrap();
        assert_eq!(keys.as_object().unwrap().len(), GRAIN_STATS_COLUMNS.len());
    }

    #[test]
    fn nan_survives_json() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"aspect_ratio\":null"));
        let back: GrainRecord = serde_json::from_str(&json).unwrap();
        assert!(back.aspect_ratio.is_nan());
        assert!(back.height_min.is_nan());
        assert_eq!(back.threshold, Direction::Below);
    }

    #[test]
    fn empty_table_keeps_schema() {
        let t = GrainStatsTable::empty("scan", Direction::Above);
        assert!(t.is_empty());
        assert_eq!(t.columns().len(), 22);
        assert_eq!(t.columns()[0], "grain_number");
        assert_eq!(t.columns()[21], "image");
    }
}

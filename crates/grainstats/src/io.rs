//! JSON configuration, scan input and report helpers.

use crate::record::{vec_f64_or_nan, GrainStatsTable, SkippedGrain};
use crate::{Direction, GrainStatsError, GrainStatsInput, GrainStatsOutput, GrainStatsParams};
use grainstats_core::{HeightMap, LabelMap};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum GrainStatsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn heights_or_nan<'de, D: Deserializer<'de>>(de: D) -> Result<HeightMap, D::Error> {
    #[derive(Deserialize)]
    struct Heights {
        width: usize,
        height: usize,
        #[serde(deserialize_with = "vec_f64_or_nan")]
        data: Vec<f64>,
    }

    let h = Heights::deserialize(de)?;
    if h.data.len() != h.width * h.height {
        return Err(serde::de::Error::custom(format!(
            "height map data has {} values, expected {} x {}",
            h.data.len(),
            h.width,
            h.height
        )));
    }
    Ok(HeightMap {
        width: h.width,
        height: h.height,
        data: h.data,
    })
}

/// A height map with its segmentation, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainScan {
    pub image_name: String,
    /// `null` cells read back as `NaN`.
    #[serde(deserialize_with = "heights_or_nan")]
    pub heights: HeightMap,
    #[serde(default)]
    pub labels: Option<LabelMap>,
}

impl GrainScan {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, GrainStatsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GrainStatsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Borrow as aggregator input for one threshold direction.
    pub fn input(&self, direction: Direction) -> GrainStatsInput<'_> {
        GrainStatsInput {
            image: self.heights.view(),
            labels: self.labels.as_ref().map(LabelMap::view),
            direction,
            image_name: &self.image_name,
        }
    }
}

/// Configuration for a `grainstats` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainStatsConfig {
    /// Path to a [`GrainScan`] JSON file.
    pub input_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub params: GrainStatsParams,
}

impl GrainStatsConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, GrainStatsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GrainStatsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("grainstats_report.json"))
    }
}

fn profiles_or_nan<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<BTreeMap<usize, Vec<f64>>, D::Error> {
    #[derive(Deserialize)]
    struct Profile(#[serde(deserialize_with = "vec_f64_or_nan")] Vec<f64>);

    Ok(BTreeMap::<usize, Profile>::deserialize(de)?
        .into_iter()
        .map(|(k, Profile(v))| (k, v))
        .collect())
}

/// Serializable summary of one run. Plot rasters are not included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainStatsReport {
    pub input_path: String,
    pub config_path: String,
    pub params: GrainStatsParams,
    #[serde(default)]
    pub table: Option<GrainStatsTable>,
    #[serde(default)]
    pub skipped: Vec<SkippedGrain>,
    #[serde(default, deserialize_with = "profiles_or_nan")]
    pub height_profiles: BTreeMap<usize, Vec<f64>>,
    /// Plot files the run wrote, if any.
    #[serde(default)]
    pub plots: Vec<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GrainStatsReport {
    /// Build a base report from the input config.
    pub fn new(cfg: &GrainStatsConfig, config_path: &Path) -> Self {
        Self {
            input_path: cfg.input_path.clone(),
            config_path: config_path.to_string_lossy().into_owned(),
            params: cfg.params.clone(),
            table: None,
            skipped: Vec::new(),
            height_profiles: BTreeMap::new(),
            plots: Vec::new(),
            error: None,
        }
    }

    /// Populate report fields from a finished run.
    pub fn set_output(&mut self, out: GrainStatsOutput) {
        self.table = Some(out.table);
        self.skipped = out.skipped;
        self.height_profiles = out.height_profiles;
        self.error = None;
    }

    /// Record an aggregation error.
    pub fn set_error(&mut self, err: GrainStatsError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, GrainStatsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GrainStatsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

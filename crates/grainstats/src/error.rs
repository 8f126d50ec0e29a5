use grainstats_core::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that abort a whole aggregation run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GrainStatsError {
    #[error("label map is {labels:?} (h, w) but image is {image:?}")]
    ShapeMismatch {
        image: (usize, usize),
        labels: (usize, usize),
    },
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// Why a single grain produced no record. Never fatal for the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Bounding box narrower than the configured minimum side.
    TooSmall,
    /// Boundary extraction found no edge pixels.
    EmptyBoundary,
    /// Fewer than three boundary points.
    InsufficientPoints,
    /// The hull has no usable edges.
    DegenerateHull,
}

impl From<GeometryError> for SkipReason {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InsufficientPoints { .. } => SkipReason::InsufficientPoints,
            GeometryError::NoHullEdges => SkipReason::DegenerateHull,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::TooSmall => "too small",
            SkipReason::EmptyBoundary => "empty boundary",
            SkipReason::InsufficientPoints => "fewer than 3 boundary points",
            SkipReason::DegenerateHull => "degenerate hull",
        };
        f.write_str(s)
    }
}

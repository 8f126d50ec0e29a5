//! Core geometry and raster utilities for per-grain AFM statistics.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about result tables, scaling to physical units or output directories;
//! those live in `grainstats`.
//!
//! Pixel points use `nalgebra::Point2<i32>` with `x` = row and `y` = column.

mod boundary;
mod error;
mod feret;
mod hull;
mod image;
mod logger;
mod morphology;
mod profile;
mod radius;
mod rectangle;
mod region;

pub use boundary::{canny_edges, extract_boundary, BoundaryMethod, CANNY_SIGMA};
pub use error::GeometryError;
pub use feret::{CaliperFeret, FeretDiameters, FeretMeasure};
pub use hull::{
    graham_scan, graham_scan_with_rng, is_counter_clockwise, sort_by_angle, ConvexHull,
};
pub use image::{
    sample_bilinear, HeightMap, HeightMapView, LabelMap, LabelMapView, Mask, Raster, RasterView,
};
pub use morphology::{binary_erosion, fill_holes, pad};
pub use profile::{FeretAxisProfile, HeightProfiler};
pub use radius::{boundary_centroid, median, radius_stats, RadiusStats};
pub use rectangle::{minimum_bounding_rectangle, BoundingRectangle};
pub use region::{crop_centred, label_regions, BoundingBox, Region};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

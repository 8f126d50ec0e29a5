//! Feret (caliper) diameters.

use crate::graham_scan;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Minimum and maximum caliper widths, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeretDiameters {
    pub min_feret: f64,
    pub max_feret: f64,
    /// Endpoints of the maximum diameter.
    pub max_feret_coords: [Point2<f64>; 2],
}

impl FeretDiameters {
    /// Multiply both diameters by a linear scale factor.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            min_feret: self.min_feret * factor,
            max_feret: self.max_feret * factor,
            ..self
        }
    }
}

/// Computes feret diameters from a region's pixel coordinates.
pub trait FeretMeasure: Sync {
    fn min_max_feret(&self, points: &[Point2<i32>]) -> FeretDiameters;
}

/// Rotating-caliper style measure over the convex hull of the points.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaliperFeret;

fn to_f64(p: Point2<i32>) -> Point2<f64> {
    Point2::new(f64::from(p.x), f64::from(p.y))
}

fn farthest_pair(points: &[Point2<f64>]) -> (f64, [Point2<f64>; 2]) {
    let mut best = (0.0, [points[0], points[0]]);
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = (b - a).norm();
            if d > best.0 {
                best = (d, [*a, *b]);
            }
        }
    }
    best
}

impl FeretMeasure for CaliperFeret {
    fn min_max_feret(&self, points: &[Point2<i32>]) -> FeretDiameters {
        if points.is_empty() {
            return FeretDiameters {
                min_feret: 0.0,
                max_feret: 0.0,
                max_feret_coords: [Point2::origin(); 2],
            };
        }

        let hull: Vec<Point2<f64>> = match graham_scan(points) {
            Ok(h) => h.points.into_iter().map(to_f64).collect(),
            Err(_) => points.iter().copied().map(to_f64).collect(),
        };
        let (max_feret, max_feret_coords) = farthest_pair(&hull);

        // The narrowest caliper rests flush on one hull edge.
        let n = hull.len();
        let min_feret = if n < 3 {
            0.0
        } else {
            (0..n)
                .filter_map(|i| {
                    let a = hull[i];
                    let edge: Vector2<f64> = hull[(i + 1) % n] - a;
                    let len = edge.norm();
                    (len > 0.0).then(|| {
                        hull.iter()
                            .map(|p| (edge.perp(&(p - a)) / len).abs())
                            .fold(0.0, f64::max)
                    })
                })
                .fold(f64::INFINITY, f64::min)
        };

        FeretDiameters {
            min_feret: if min_feret.is_finite() { min_feret } else { 0.0 },
            max_feret,
            max_feret_coords,
        }
    }
}

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Distances from the boundary centroid to each boundary point, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Mean of the points' coordinates, or `None` for an empty set.
pub fn boundary_centroid(points: &[Point2<i32>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector2::<f64>::zeros(), |acc, p| {
        acc + Vector2::new(f64::from(p.x), f64::from(p.y))
    });
    Some(Point2::from(sum / points.len() as f64))
}

/// Median with the even-length convention of averaging the two middle values.
///
/// NaN entries must be filtered out by the caller.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

/// Radius statistics of `boundary` about its own centroid.
pub fn radius_stats(boundary: &[Point2<i32>]) -> Option<RadiusStats> {
    let centroid = boundary_centroid(boundary)?;
    let radii: Vec<f64> = boundary
        .iter()
        .map(|p| (Point2::new(f64::from(p.x), f64::from(p.y)) - centroid).norm())
        .collect();

    let min = radii.iter().copied().fold(f64::INFINITY, f64::min);
    let max = radii.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = radii.iter().sum::<f64>() / radii.len() as f64;
    let median = median(&radii)?;
    Some(RadiusStats {
        min,
        max,
        mean,
        median,
    })
}

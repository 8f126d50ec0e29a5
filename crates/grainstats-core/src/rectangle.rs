//! Minimum-area bounding rectangle over hull edge orientations.

use crate::GeometryError;
use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest rectangle found among the hull edge orientations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingRectangle {
    /// Shorter side, in pixels.
    pub width: f64,
    /// Longer side, in pixels.
    pub length: f64,
    pub area: f64,
    /// `width / length`; `NaN` for a zero-size rectangle.
    pub aspect_ratio: f64,
    /// Orientation of the winning hull edge, radians.
    pub angle: f64,
    /// Index into the simplex list of the winning edge.
    pub simplex: usize,
    /// Rectangle corners in input coordinates.
    pub corners: [Point2<f64>; 4],
}

impl BoundingRectangle {
    pub fn centre(&self) -> Point2<f64> {
        let sum = self
            .corners
            .iter()
            .fold(Vector2::zeros(), |acc, c| acc + c.coords);
        Point2::from(sum / 4.0)
    }
}

struct Extremes {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Extremes {
    fn of(points: &[Vector2<f64>]) -> Self {
        let mut e = Extremes {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for p in points {
            e.x_min = e.x_min.min(p.x);
            e.x_max = e.x_max.max(p.x);
            e.y_min = e.y_min.min(p.y);
            e.y_max = e.y_max.max(p.y);
        }
        e
    }

    fn extent(&self) -> (f64, f64) {
        (self.x_max - self.x_min, self.y_max - self.y_min)
    }
}

/// Rotation by `-angle`, which maps a direction at `angle` onto the x axis.
fn unrotation(angle: f64) -> Matrix2<f64> {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, s, -s, c)
}

/// Search every hull edge orientation for the least-area enclosing rectangle.
///
/// All `points` are translated to their centroid and rotated so the edge is
/// axis-aligned; the first strictly smallest box wins.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points, simplices), fields(n = points.len(), edges = simplices.len()))
)]
pub fn minimum_bounding_rectangle(
    points: &[Point2<i32>],
    simplices: &[[usize; 2]],
) -> Result<BoundingRectangle, GeometryError> {
    if simplices.is_empty() {
        return Err(GeometryError::NoHullEdges);
    }
    if points.is_empty() {
        return Err(GeometryError::InsufficientPoints {
            got: 0,
            required: 1,
        });
    }

    let pts: Vec<Vector2<f64>> = points
        .iter()
        .map(|p| Vector2::new(f64::from(p.x), f64::from(p.y)))
        .collect();
    let centroid = pts.iter().sum::<Vector2<f64>>() / pts.len() as f64;
    let centred: Vec<Vector2<f64>> = pts.iter().map(|p| p - centroid).collect();

    let mut best: Option<(f64, f64, Matrix2<f64>, Extremes, usize)> = None;
    let mut rotated = Vec::with_capacity(centred.len());
    for (k, s) in simplices.iter().enumerate() {
        let delta = pts[s[1]] - pts[s[0]];
        let angle = delta.y.atan2(delta.x);
        let rot = unrotation(angle);

        rotated.clear();
        rotated.extend(centred.iter().map(|p| rot * p));
        let ext = Extremes::of(&rotated);
        let (dx, dy) = ext.extent();
        let area = dx * dy;

        if best.as_ref().is_none_or(|(a, ..)| area < *a) {
            best = Some((area, angle, rot, ext, k));
        }
    }

    let Some((area, angle, rot, ext, simplex)) = best else {
        return Err(GeometryError::NoHullEdges);
    };
    let (dx, dy) = ext.extent();
    let width = dx.min(dy);
    let length = dx.max(dy);

    let inverse = rot.transpose();
    let corners = [
        Vector2::new(ext.x_min, ext.y_min),
        Vector2::new(ext.x_max, ext.y_min),
        Vector2::new(ext.x_max, ext.y_max),
        Vector2::new(ext.x_min, ext.y_max),
    ]
    .map(|c| Point2::from(inverse * c + centroid));

    Ok(BoundingRectangle {
        width,
        length,
        area,
        aspect_ratio: width / length,
        angle,
        simplex,
        corners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graham_scan;
    use approx::assert_abs_diff_eq;

    fn square_ring(n: i32) -> Vec<Point2<i32>> {
        let mut pts = Vec::new();
        for r in 0..n {
            for c in 0..n {
                if r == 0 || c == 0 || r == n - 1 || c == n - 1 {
                    pts.push(Point2::new(r, c));
                }
            }
        }
        pts
    }

    fn axis_aligned_area(points: &[Point2<i32>]) -> f64 {
        let xs = points.iter().map(|p| p.x);
        let ys = points.iter().map(|p| p.y);
        let dx = xs.clone().max().unwrap() - xs.min().unwrap();
        let dy = ys.clone().max().unwrap() - ys.min().unwrap();
        f64::from(dx) * f64::from(dy)
    }

    #[test]
    fn square_is_its_own_rectangle() {
        let pts = square_ring(5);
        let hull = graham_scan(&pts).unwrap();
        let rect = minimum_bounding_rectangle(&pts, &hull.simplices).unwrap();
        assert_abs_diff_eq!(rect.width, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.length, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.aspect_ratio, 1.0, epsilon = 1e-7);
        assert!(rect.simplex < hull.simplices.len());
    }

    #[test]
    fn tilted_bar_beats_axis_aligned_box() {
        // A diagonal bar three pixels thick.
        let mut pts = Vec::new();
        for i in 0..20 {
            for t in 0..3 {
                pts.push(Point2::new(i + t, i));
            }
        }
        let hull = graham_scan(&pts).unwrap();
        let rect = minimum_bounding_rectangle(&pts, &hull.simplices).unwrap();
        assert!(rect.area < axis_aligned_area(&pts));
        assert!(rect.aspect_ratio > 0.0 && rect.aspect_ratio < 0.2);
        assert!(rect.width <= rect.length);
    }

    #[test]
    fn rectangle_never_exceeds_axis_aligned_box() {
        let pts: Vec<Point2<i32>> = (0..60)
            .map(|i| {
                let t = i as f64 * 0.21;
                Point2::new((15.0 * t.cos() + 3.0 * t.sin()) as i32, (6.0 * t.sin()) as i32)
            })
            .collect();
        let hull = graham_scan(&pts).unwrap();
        let rect = minimum_bounding_rectangle(&pts, &hull.simplices).unwrap();
        assert!(rect.area <= axis_aligned_area(&pts) + 1e-9);
        assert!(rect.aspect_ratio > 0.0 && rect.aspect_ratio <= 1.0);
    }

    #[test]
    fn corners_round_trip_to_centroid_for_symmetric_shape() {
        let pts = square_ring(7);
        let hull = graham_scan(&pts).unwrap();
        let rect = minimum_bounding_rectangle(&pts, &hull.simplices).unwrap();
        let centre = rect.centre();
        assert_abs_diff_eq!(centre.x, 3.0, epsilon = 1e-7);
        assert_abs_diff_eq!(centre.y, 3.0, epsilon = 1e-7);
        for c in &rect.corners {
            assert!(pts
                .iter()
                .any(|p| (f64::from(p.x) - c.x).hypot(f64::from(p.y) - c.y) < 1e-7));
        }
    }

    #[test]
    fn corners_enclose_every_point() {
        let pts: Vec<Point2<i32>> = vec![
            Point2::new(0, 0),
            Point2::new(6, 2),
            Point2::new(4, 8),
            Point2::new(-1, 5),
            Point2::new(2, 3),
        ];
        let hull = graham_scan(&pts).unwrap();
        let rect = minimum_bounding_rectangle(&pts, &hull.simplices).unwrap();
        let rot = unrotation(rect.angle);
        let centroid = pts
            .iter()
            .map(|p| Vector2::new(f64::from(p.x), f64::from(p.y)))
            .sum::<Vector2<f64>>()
            / pts.len() as f64;
        let corners: Vec<Vector2<f64>> = rect
            .corners
            .iter()
            .map(|c| rot * (c.coords - centroid))
            .collect();
        let box_ext = Extremes::of(&corners);
        for p in &pts {
            let q = rot * (Vector2::new(f64::from(p.x), f64::from(p.y)) - centroid);
            assert!(q.x >= box_ext.x_min - 1e-9 && q.x <= box_ext.x_max + 1e-9);
            assert!(q.y >= box_ext.y_min - 1e-9 && q.y <= box_ext.y_max + 1e-9);
        }
        assert_abs_diff_eq!(box_ext.extent().0 * box_ext.extent().1, rect.area, epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_give_zero_aspect() {
        let pts = vec![Point2::new(0, 0), Point2::new(1, 0), Point2::new(2, 0)];
        let rect = minimum_bounding_rectangle(&pts, &[[0, 2], [2, 0]]).unwrap();
        assert_eq!(rect.area, 0.0);
        assert_abs_diff_eq!(rect.length, 2.0, epsilon = 1e-12);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.aspect_ratio, 0.0);
    }

    #[test]
    fn no_edges_is_an_error() {
        let pts = vec![Point2::new(0, 0)];
        assert_eq!(
            minimum_bounding_rectangle(&pts, &[]),
            Err(GeometryError::NoHullEdges)
        );
    }
}

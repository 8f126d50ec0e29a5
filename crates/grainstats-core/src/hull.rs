//! Graham scan convex hull over integer boundary points.
//!
//! The anchor is the point with the smallest `y` (column), ties broken by the
//! smallest `x` (row). Every other point is ordered by the angle it makes with
//! the anchor, nearest first within an angle, and the scan keeps only strict
//! counter-clockwise turns.

use crate::GeometryError;
use nalgebra::Point2;
use rand::Rng;
use std::collections::HashMap;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Result of a Graham scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    /// Hull vertices, counter-clockwise, starting at the anchor.
    pub points: Vec<Point2<i32>>,
    /// Index of each hull vertex in the input (first occurrence by value).
    pub indices: Vec<usize>,
    /// Hull edges as input index pairs; `simplices[i]` ends at `indices[i]`.
    pub simplices: Vec<[usize; 2]>,
}

impl ConvexHull {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Strict left turn `p1 -> p2 -> p3`.
///
/// Sign of the homogeneous determinant `|p1 1; p2 1; p3 1|`, evaluated
/// exactly. Collinear triples are not counter-clockwise.
#[inline]
pub fn is_counter_clockwise(p1: Point2<i32>, p2: Point2<i32>, p3: Point2<i32>) -> bool {
    let (x1, y1) = (i64::from(p1.x), i64::from(p1.y));
    let (x2, y2) = (i64::from(p2.x), i64::from(p2.y));
    let (x3, y3) = (i64::from(p3.x), i64::from(p3.y));
    (x2 - x1) * (y3 - y1) - (y2 - y1) * (x3 - x1) > 0
}

#[inline]
fn angle_to(anchor: Point2<i32>, p: Point2<i32>) -> f64 {
    f64::from(p.y - anchor.y).atan2(f64::from(p.x - anchor.x))
}

#[inline]
fn squared_distance(anchor: Point2<i32>, p: Point2<i32>) -> i64 {
    let dx = i64::from(p.x - anchor.x);
    let dy = i64::from(p.y - anchor.y);
    dx * dx + dy * dy
}

fn find_anchor(points: &[Point2<i32>]) -> Option<Point2<i32>> {
    points
        .iter()
        .copied()
        .min_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)))
}

struct Keyed {
    angle: f64,
    dist2: i64,
    point: Point2<i32>,
}

/// Order `points` by angle about `anchor`, nearest first within an angle.
///
/// Randomised three-way partition around a random pivot angle, driven by an
/// explicit work stack. The result does not depend on the pivots drawn.
pub fn sort_by_angle<R: Rng + ?Sized>(
    points: &[Point2<i32>],
    anchor: Point2<i32>,
    rng: &mut R,
) -> Vec<Point2<i32>> {
    let mut items: Vec<Keyed> = points
        .iter()
        .map(|&p| Keyed {
            angle: angle_to(anchor, p),
            dist2: squared_distance(anchor, p),
            point: p,
        })
        .collect();

    let mut stack = vec![(0usize, items.len())];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo <= 1 {
            continue;
        }
        let pivot = items[rng.random_range(lo..hi)].angle;

        // Dutch flag: [lo, lt) < pivot, [lt, i) == pivot, (gt, hi) > pivot.
        let (mut lt, mut i, mut gt) = (lo, lo, hi);
        while i < gt {
            let a = items[i].angle;
            if a < pivot {
                items.swap(lt, i);
                lt += 1;
                i += 1;
            } else if a > pivot {
                gt -= 1;
                items.swap(i, gt);
            } else {
                i += 1;
            }
        }

        items[lt..gt].sort_by_key(|k| k.dist2);
        stack.push((lo, lt));
        stack.push((gt, hi));
    }

    items.into_iter().map(|k| k.point).collect()
}

/// Convex hull of `points` with a thread-local random pivot source.
pub fn graham_scan(points: &[Point2<i32>]) -> Result<ConvexHull, GeometryError> {
    graham_scan_with_rng(points, &mut rand::rng())
}

/// Convex hull of `points`, drawing sort pivots from `rng`.
///
/// Requires at least three points. Duplicated coordinates are kept; the
/// reported index of a hull vertex is the first input occurrence of its value.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points, rng), fields(n = points.len()))
)]
pub fn graham_scan_with_rng<R: Rng + ?Sized>(
    points: &[Point2<i32>],
    rng: &mut R,
) -> Result<ConvexHull, GeometryError> {
    const REQUIRED: usize = 3;
    let anchor = match find_anchor(points) {
        Some(a) if points.len() >= REQUIRED => a,
        _ => {
            return Err(GeometryError::InsufficientPoints {
                got: points.len(),
                required: REQUIRED,
            })
        }
    };

    let mut sorted = sort_by_angle(points, anchor, rng);
    if let Some(pos) = sorted.iter().position(|&p| p == anchor) {
        sorted.remove(pos);
    }

    let mut hull = vec![anchor, sorted[0]];
    for &p in &sorted[1..] {
        while hull.len() >= 2 && !is_counter_clockwise(hull[hull.len() - 2], hull[hull.len() - 1], p)
        {
            hull.pop();
        }
        hull.push(p);
    }

    let mut first_index: HashMap<(i32, i32), usize> = HashMap::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        first_index.entry((p.x, p.y)).or_insert(i);
    }
    let indices: Vec<usize> = hull.iter().map(|p| first_index[&(p.x, p.y)]).collect();

    let n = indices.len();
    let simplices = (0..n)
        .map(|i| [indices[(i + n - 1) % n], indices[i]])
        .collect();

    Ok(ConvexHull {
        points: hull,
        indices,
        simplices,
    })
}

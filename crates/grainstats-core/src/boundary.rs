//! Boundary extraction from a filled region mask.

use crate::morphology::{binary_erosion, fill_holes, pad};
use crate::Mask;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Smoothing used by the canny boundary method.
pub const CANNY_SIGMA: f64 = 3.0;

const CANNY_LOW: f64 = 0.1;
const CANNY_HIGH: f64 = 0.2;

/// How the edge pixels of a grain mask are found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMethod {
    /// Filled mask minus its one-step cross erosion.
    #[default]
    BinaryErosion,
    /// Canny edges of the filled mask.
    Canny,
}

/// Boundary points of `mask` in row-major order. Holes are filled first.
///
/// An empty result means the mask has no shape to measure.
pub fn extract_boundary(mask: &Mask, method: BoundaryMethod) -> Vec<Point2<i32>> {
    let filled = fill_holes(mask);
    let edges = match method {
        BoundaryMethod::BinaryErosion => erosion_edges(&filled),
        BoundaryMethod::Canny => canny_edges(&filled, CANNY_SIGMA),
    };
    edges.points()
}

fn erosion_edges(filled: &Mask) -> Mask {
    let eroded = binary_erosion(&pad(filled, 1));
    let mut edges = Mask::filled(filled.width, filled.height, false);
    for r in 0..filled.height {
        for c in 0..filled.width {
            edges.set(r, c, filled.get(r, c) && !eroded.get(r + 1, c + 1));
        }
    }
    edges
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let mut k: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// Separable convolution with zero padding.
fn convolve_separable(data: &[f64], w: usize, h: usize, k: &[f64]) -> Vec<f64> {
    let radius = (k.len() / 2) as isize;
    let mut tmp = vec![0.0; w * h];
    for r in 0..h {
        for c in 0..w {
            let mut acc = 0.0;
            for (i, &kv) in k.iter().enumerate() {
                let cc = c as isize + i as isize - radius;
                if cc >= 0 && (cc as usize) < w {
                    acc += kv * data[r * w + cc as usize];
                }
            }
            tmp[r * w + c] = acc;
        }
    }
    let mut out = vec![0.0; w * h];
    for r in 0..h {
        for c in 0..w {
            let mut acc = 0.0;
            for (i, &kv) in k.iter().enumerate() {
                let rr = r as isize + i as isize - radius;
                if rr >= 0 && (rr as usize) < h {
                    acc += kv * tmp[rr as usize * w + c];
                }
            }
            out[r * w + c] = acc;
        }
    }
    out
}

/// Gaussian blur renormalised by the blurred support, so the raster edge
/// does not read as a step.
fn smooth(mask: &Mask, sigma: f64) -> Vec<f64> {
    let (w, h) = (mask.width, mask.height);
    let k = gaussian_kernel(sigma);
    let values: Vec<f64> = mask.data.iter().map(|&v| f64::from(u8::from(v))).collect();
    let blurred = convolve_separable(&values, w, h, &k);
    let support = convolve_separable(&vec![1.0; w * h], w, h, &k);
    blurred
        .iter()
        .zip(&support)
        .map(|(&b, &s)| if s > f64::EPSILON { b / s } else { 0.0 })
        .collect()
}

/// Canny-style edge map of a binary mask.
///
/// Sobel gradients of the smoothed mask, non-maximum suppression along the
/// quantised gradient direction and 8-connected hysteresis. The outermost
/// pixel ring never carries an edge.
pub fn canny_edges(mask: &Mask, sigma: f64) -> Mask {
    let (w, h) = (mask.width, mask.height);
    let mut edges = Mask::filled(w, h, false);
    if w < 3 || h < 3 {
        return edges;
    }

    let s = smooth(mask, sigma);
    let at = |r: usize, c: usize| s[r * w + c];

    // x = row axis, y = column axis.
    let mut gx = vec![0.0; w * h];
    let mut gy = vec![0.0; w * h];
    let mut mag = vec![0.0; w * h];
    for r in 1..h - 1 {
        for c in 1..w - 1 {
            let dx = (at(r + 1, c - 1) + 2.0 * at(r + 1, c) + at(r + 1, c + 1))
                - (at(r - 1, c - 1) + 2.0 * at(r - 1, c) + at(r - 1, c + 1));
            let dy = (at(r - 1, c + 1) + 2.0 * at(r, c + 1) + at(r + 1, c + 1))
                - (at(r - 1, c - 1) + 2.0 * at(r, c - 1) + at(r + 1, c - 1));
            let i = r * w + c;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.hypot(dy);
        }
    }

    let mut thin = vec![0.0; w * h];
    for r in 1..h - 1 {
        for c in 1..w - 1 {
            let i = r * w + c;
            let m = mag[i];
            if m < CANNY_LOW {
                continue;
            }
            // Quantise the gradient direction into one of four neighbour axes.
            let angle = gy[i].atan2(gx[i]).to_degrees().rem_euclid(180.0);
            let (dr, dc): (isize, isize) = if !(22.5..157.5).contains(&angle) {
                (1, 0)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (0, 1)
            } else {
                (1, -1)
            };
            let fwd = mag[(r as isize + dr) as usize * w + (c as isize + dc) as usize];
            let back = mag[(r as isize - dr) as usize * w + (c as isize - dc) as usize];
            if m >= fwd && m >= back {
                thin[i] = m;
            }
        }
    }

    let mut stack: Vec<(usize, usize)> = Vec::new();
    for r in 1..h - 1 {
        for c in 1..w - 1 {
            if thin[r * w + c] >= CANNY_HIGH && !edges.get(r, c) {
                edges.set(r, c, true);
                stack.push((r, c));
            }
        }
    }
    while let Some((r, c)) = stack.pop() {
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                let nr = (r as isize + dr) as usize;
                let nc = (c as isize + dc) as usize;
                if nr == 0 || nc == 0 || nr + 1 >= h || nc + 1 >= w {
                    continue;
                }
                if !edges.get(nr, nc) && thin[nr * w + nc] >= CANNY_LOW {
                    edges.set(nr, nc, true);
                    stack.push((nr, nc));
                }
            }
        }
    }
    edges
}

//! Binary morphology on boolean masks.
//!
//! Both operations use the 4-connected cross as structuring element. Cells
//! outside the mask read as background.

use crate::Mask;

const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[inline]
fn neighbour(mask: &Mask, row: usize, col: usize, dr: isize, dc: isize) -> Option<(usize, usize)> {
    let r = row.checked_add_signed(dr)?;
    let c = col.checked_add_signed(dc)?;
    (r < mask.height && c < mask.width).then_some((r, c))
}

/// Surround `mask` with `width` background cells on every side.
pub fn pad(mask: &Mask, width: usize) -> Mask {
    let mut out = Mask::filled(mask.width + 2 * width, mask.height + 2 * width, false);
    for r in 0..mask.height {
        for c in 0..mask.width {
            if mask.get(r, c) {
                out.set(r + width, c + width, true);
            }
        }
    }
    out
}

/// One erosion step: a cell survives only if it and its four neighbours are set.
pub fn binary_erosion(mask: &Mask) -> Mask {
    let mut out = Mask::filled(mask.width, mask.height, false);
    for r in 0..mask.height {
        for c in 0..mask.width {
            if !mask.get(r, c) {
                continue;
            }
            let interior = CROSS.iter().all(|&(dr, dc)| {
                neighbour(mask, r, c, dr, dc).is_some_and(|(nr, nc)| mask.get(nr, nc))
            });
            out.set(r, c, interior);
        }
    }
    out
}

/// Fill background components that do not touch the mask border.
pub fn fill_holes(mask: &Mask) -> Mask {
    let (w, h) = (mask.width, mask.height);
    let mut outside = vec![false; w * h];
    let mut stack = Vec::new();

    for r in 0..h {
        for c in 0..w {
            let on_border = r == 0 || c == 0 || r + 1 == h || c + 1 == w;
            if on_border && !mask.get(r, c) && !outside[r * w + c] {
                outside[r * w + c] = true;
                stack.push((r, c));
            }
        }
    }

    while let Some((r, c)) = stack.pop() {
        for &(dr, dc) in &CROSS {
            if let Some((nr, nc)) = neighbour(mask, r, c, dr, dc) {
                let idx = nr * w + nc;
                if !mask.get(nr, nc) && !outside[idx] {
                    outside[idx] = true;
                    stack.push((nr, nc));
                }
            }
        }
    }

    Mask {
        width: w,
        height: h,
        data: outside.into_iter().map(|o| !o).collect(),
    }
}

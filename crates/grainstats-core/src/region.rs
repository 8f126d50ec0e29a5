//! Labelled region extraction and centred cropping.

use crate::{LabelMapView, Mask, Raster, RasterView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned pixel box; `min_*` inclusive, `max_*` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl BoundingBox {
    pub fn height(&self) -> usize {
        self.max_row - self.min_row
    }

    pub fn width(&self) -> usize {
        self.max_col - self.min_col
    }

    pub fn area(&self) -> usize {
        self.height() * self.width()
    }

    /// Shorter of the two sides.
    pub fn min_side(&self) -> usize {
        self.height().min(self.width())
    }

    /// Integer centre `((min + max) / 2)` per axis.
    pub fn centre(&self) -> (usize, usize) {
        (
            (self.min_row + self.max_row) / 2,
            (self.min_col + self.max_col) / 2,
        )
    }

    fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row + 1);
        self.max_col = self.max_col.max(col + 1);
    }
}

/// One labelled region, its box and its mask cropped to that box.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub label: u32,
    pub bbox: BoundingBox,
    pub mask: Mask,
    /// Pixel count of the label.
    pub area: usize,
}

/// Regions of every label ≥ 1, in ascending label order. Label 0 is background.
pub fn label_regions(labels: &LabelMapView<'_>) -> Vec<Region> {
    let mut boxes: BTreeMap<u32, BoundingBox> = BTreeMap::new();
    for r in 0..labels.height {
        for c in 0..labels.width {
            let l = labels.get(r, c);
            if l == 0 {
                continue;
            }
            boxes
                .entry(l)
                .or_insert(BoundingBox {
                    min_row: r,
                    min_col: c,
                    max_row: r + 1,
                    max_col: c + 1,
                })
                .include(r, c);
        }
    }

    boxes
        .into_iter()
        .map(|(label, bbox)| {
            let mut mask = Mask::filled(bbox.width(), bbox.height(), false);
            let mut area = 0;
            for r in bbox.min_row..bbox.max_row {
                for c in bbox.min_col..bbox.max_col {
                    if labels.get(r, c) == label {
                        mask.set(r - bbox.min_row, c - bbox.min_col, true);
                        area += 1;
                    }
                }
            }
            Region {
                label,
                bbox,
                mask,
                area,
            }
        })
        .collect()
}

/// Start of a `side`-long window centred on `centre`, shifted to lie inside `[0, len)`.
fn window_start(centre: usize, half: usize, len: usize) -> usize {
    let side = half.saturating_mul(2).saturating_add(1);
    let start = centre.saturating_sub(half);
    if start.saturating_add(side) > len {
        len.saturating_sub(side)
    } else {
        start
    }
}

/// Square crop of side `2 * half + 1` around `centre = (row, col)`.
///
/// Windows reaching past an edge are shifted back inside the raster; a window
/// larger than the raster is clipped to it, so any `half` is accepted.
pub fn crop_centred<T: Copy>(
    view: &RasterView<'_, T>,
    centre: (usize, usize),
    half: usize,
) -> Raster<T> {
    let half = half.min(view.height.max(view.width));
    let side = 2 * half + 1;
    let row0 = window_start(centre.0, half, view.height);
    let col0 = window_start(centre.1, half, view.width);
    view.crop(row0, col0, row0 + side, col0 + side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelMap;

    #[test]
    fn regions_come_in_label_order() {
        let labels = LabelMap::from_rows(&[
            vec![0, 2, 2, 0],
            vec![0, 2, 0, 0],
            vec![1, 0, 0, 3],
            vec![1, 1, 0, 3],
        ]);
        let regions = label_regions(&labels.view());
        let ids: Vec<u32> = regions.iter().map(|r| r.label).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let two = &regions[1];
        assert_eq!(
            two.bbox,
            BoundingBox {
                min_row: 0,
                min_col: 1,
                max_row: 2,
                max_col: 3
            }
        );
        assert_eq!(two.area, 3);
        assert_eq!(two.mask.data, vec![true, true, true, false]);
        assert_eq!(two.bbox.area(), 4);
    }

    #[test]
    fn background_only_has_no_regions() {
        let labels = LabelMap::filled(4, 4, 0);
        assert!(label_regions(&labels.view()).is_empty());
    }

    #[test]
    fn non_contiguous_labels_are_kept() {
        let labels = LabelMap::from_rows(&[vec![7, 0, 4]]);
        let ids: Vec<u32> = label_regions(&labels.view())
            .iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(ids, vec![4, 7]);
    }

    #[test]
    fn crop_inside_image_is_centred() {
        let img: Raster<u32> = Raster {
            width: 10,
            height: 10,
            data: (0..100).collect(),
        };
        let c = crop_centred(&img.view(), (5, 5), 1);
        assert_eq!(c.shape(), (3, 3));
        assert_eq!(c.data, vec![44, 45, 46, 54, 55, 56, 64, 65, 66]);
    }

    #[test]
    fn crop_shifts_at_edges() {
        let img: Raster<u32> = Raster {
            width: 10,
            height: 10,
            data: (0..100).collect(),
        };
        let top_left = crop_centred(&img.view(), (0, 1), 2);
        assert_eq!(top_left.shape(), (5, 5));
        assert_eq!(top_left.get(0, 0), 0);

        let bottom_right = crop_centred(&img.view(), (9, 9), 2);
        assert_eq!(bottom_right.shape(), (5, 5));
        assert_eq!(bottom_right.get(4, 4), 99);
        assert_eq!(bottom_right.get(0, 0), 55);
    }

    #[test]
    fn oversized_crop_is_clipped() {
        let img = Raster::filled(4, 3, 1.0_f64);
        let c = crop_centred(&img.view(), (1, 1), 5);
        assert_eq!(c.shape(), (3, 4));
    }

    #[test]
    fn unbounded_half_side_is_clipped() {
        let img = Raster::filled(6, 5, 2u32);
        let c = crop_centred(&img.view(), (2, 3), usize::MAX);
        assert_eq!(c.shape(), (5, 6));
        assert_eq!(window_start(3, usize::MAX, 6), 0);
    }
}

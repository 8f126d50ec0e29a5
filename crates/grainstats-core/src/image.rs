use serde::{Deserialize, Serialize};

/// Borrowed row-major raster.
#[derive(Clone, Copy, Debug)]
pub struct RasterView<'a, T> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [T], // row-major, len = w*h
}

/// Owned row-major raster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Raster<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

pub type HeightMap = Raster<f64>;
pub type HeightMapView<'a> = RasterView<'a, f64>;
pub type LabelMap = Raster<u32>;
pub type LabelMapView<'a> = RasterView<'a, u32>;
pub type Mask = Raster<bool>;

impl<'a, T: Copy> RasterView<'a, T> {
    pub fn new(width: usize, height: usize, data: &'a [T]) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    /// Copy the half-open window `[row0, row1) x [col0, col1)`.
    pub fn crop(&self, row0: usize, col0: usize, row1: usize, col1: usize) -> Raster<T> {
        let row1 = row1.min(self.height);
        let col1 = col1.min(self.width);
        let height = row1.saturating_sub(row0);
        let width = col1.saturating_sub(col0);
        let mut data = Vec::with_capacity(width * height);
        for r in row0..row1 {
            let start = r * self.width;
            data.extend_from_slice(&self.data[start + col0..start + col1]);
        }
        Raster {
            width,
            height,
            data,
        }
    }

    pub fn to_owned(&self) -> Raster<T> {
        Raster {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

impl<T: Copy> Raster<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_rows(rows: &[Vec<T>]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> RasterView<'_, T> {
        RasterView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.width + col] = value;
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl Raster<bool> {
    /// Foreground pixel coordinates in row-major order.
    pub fn points(&self) -> Vec<nalgebra::Point2<i32>> {
        let mut out = Vec::new();
        for r in 0..self.height {
            for c in 0..self.width {
                if self.get(r, c) {
                    out.push(nalgebra::Point2::new(r as i32, c as i32));
                }
            }
        }
        out
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

#[inline]
fn get_height(src: &HeightMapView<'_>, row: i64, col: i64) -> f64 {
    if row < 0 || col < 0 || row >= src.height as i64 || col >= src.width as i64 {
        return 0.0;
    }
    src.data[row as usize * src.width + col as usize]
}

/// Bilinear sample at fractional `(row, col)`; out-of-bounds taps read as 0.
#[inline]
pub fn sample_bilinear(src: &HeightMapView<'_>, row: f64, col: f64) -> f64 {
    let r0 = row.floor() as i64;
    let c0 = col.floor() as i64;
    let fr = row - r0 as f64;
    let fc = col - c0 as f64;

    let p00 = get_height(src, r0, c0);
    let p01 = get_height(src, r0, c0 + 1);
    let p10 = get_height(src, r0 + 1, c0);
    let p11 = get_height(src, r0 + 1, c0 + 1);

    let a = p00 + fc * (p01 - p00);
    let b = p10 + fc * (p11 - p10);
    a + fr * (b - a)
}

//! Descriptors of per-grain rasters for an external plotting step.

use grainstats_core::{HeightMap, Mask};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which raster a descriptor carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotName {
    /// Image heights under the grain window.
    GrainImage,
    GrainMask,
    /// Heights inside the grain, `NaN` elsewhere.
    GrainMaskImage,
}

impl PlotName {
    pub const ALL: [PlotName; 3] = [
        PlotName::GrainImage,
        PlotName::GrainMask,
        PlotName::GrainMaskImage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlotName::GrainImage => "grain_image",
            PlotName::GrainMask => "grain_mask",
            PlotName::GrainMaskImage => "grain_mask_image",
        }
    }
}

impl fmt::Display for PlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "raster", rename_all = "snake_case")]
pub enum PlotArray {
    Image(HeightMap),
    Mask(Mask),
}

impl PlotArray {
    /// `(height, width)` of the raster.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            PlotArray::Image(r) => r.shape(),
            PlotArray::Mask(r) => r.shape(),
        }
    }

    /// Min-max normalised 8-bit rendering. `NaN` pixels and masked-out
    /// pixels are black; a flat image renders mid-grey.
    #[cfg(feature = "image")]
    pub fn to_gray_image(&self) -> image::GrayImage {
        match self {
            PlotArray::Mask(m) => image::GrayImage::from_fn(m.width as u32, m.height as u32, |x, y| {
                image::Luma([if m.get(y as usize, x as usize) { 255 } else { 0 }])
            }),
            PlotArray::Image(img) => {
                let (lo, hi) = img
                    .data
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                let span = hi - lo;
                image::GrayImage::from_fn(img.width as u32, img.height as u32, |x, y| {
                    let v = img.get(y as usize, x as usize);
                    let g = if v.is_nan() {
                        0.0
                    } else if span > 0.0 {
                        255.0 * (v - lo) / span
                    } else {
                        128.0
                    };
                    image::Luma([g.round().clamp(0.0, 255.0) as u8])
                })
            }
        }
    }
}

/// One raster to plot, with where and under what name to write it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrainPlotData {
    pub data: PlotArray,
    pub output_dir: PathBuf,
    /// `{image}_{name}_{grain_number}`.
    pub filename: String,
    pub name: PlotName,
}

impl GrainPlotData {
    pub(crate) fn new(
        data: PlotArray,
        output_dir: PathBuf,
        image_name: &str,
        name: PlotName,
        grain_number: usize,
    ) -> Self {
        Self {
            data,
            output_dir,
            filename: format!("{image_name}_{name}_{grain_number}"),
            name,
        }
    }

    /// Target path with the given file extension.
    pub fn path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{extension}", self.filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grainstats_core::Raster;

    #[test]
    fn filename_and_path() {
        let d = GrainPlotData::new(
            PlotArray::Mask(Mask::filled(2, 2, true)),
            PathBuf::from("grains/above"),
            "scan",
            PlotName::GrainMask,
            4,
        );
        assert_eq!(d.filename, "scan_grain_mask_4");
        assert_eq!(d.path("png"), PathBuf::from("grains/above/scan_grain_mask_4.png"));
        assert_eq!(d.data.shape(), (2, 2));
    }

    #[cfg(feature = "image")]
    #[test]
    fn gray_image_is_normalised() {
        let img = PlotArray::Image(Raster::from_rows(&[vec![0.0, 1.0], vec![f64::NAN, 2.0]]));
        let g = img.to_gray_image();
        assert_eq!(g.dimensions(), (2, 2));
        assert_eq!(g.get_pixel(0, 0)[0], 0);
        assert_eq!(g.get_pixel(1, 0)[0], 128);
        assert_eq!(g.get_pixel(0, 1)[0], 0);
        assert_eq!(g.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn image_plot_serialises_with_kind_tag() {
        let d = PlotArray::Image(Raster::filled(1, 1, 1.5));
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["kind"], "image");
        assert_eq!(v["raster"]["width"], 1);
    }
}

//! Height profiles across a grain.

use crate::{sample_bilinear, CaliperFeret, FeretMeasure, HeightMapView, Mask};

/// Extracts a 1D height profile from a cropped grain image and its mask.
pub trait HeightProfiler: Sync {
    fn profile(&self, image: &HeightMapView<'_>, mask: &Mask) -> Vec<f64>;
}

/// Samples the image at unit spacing along the grain's maximum feret axis.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeretAxisProfile;

impl HeightProfiler for FeretAxisProfile {
    fn profile(&self, image: &HeightMapView<'_>, mask: &Mask) -> Vec<f64> {
        let points = mask.points();
        if points.is_empty() {
            return Vec::new();
        }
        let feret = CaliperFeret.min_max_feret(&points);
        let [a, b] = feret.max_feret_coords;
        let steps = feret.max_feret.round() as usize;
        if steps == 0 {
            return vec![sample_bilinear(image, a.x, a.y)];
        }
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let p = a + (b - a) * t;
                sample_bilinear(image, p.x, p.y)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Raster;
    use approx::assert_abs_diff_eq;

    #[test]
    fn profile_follows_longest_axis() {
        // Heights rise with the column index; the grain is a horizontal bar.
        let w = 9;
        let h = 3;
        let data: Vec<f64> = (0..h).flat_map(|_| (0..w).map(|c| c as f64)).collect();
        let img = Raster {
            width: w,
            height: h,
            data,
        };
        let mut mask = Mask::filled(w, h, false);
        for c in 0..w {
            mask.set(1, c, true);
        }
        let profile = FeretAxisProfile.profile(&img.view(), &mask);
        assert_eq!(profile.len(), 9);
        let first = profile[0];
        let last = profile[profile.len() - 1];
        assert_abs_diff_eq!((last - first).abs(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_mask_gives_empty_profile() {
        let img = Raster::filled(3, 3, 1.0);
        let mask = Mask::filled(3, 3, false);
        assert!(FeretAxisProfile.profile(&img.view(), &mask).is_empty());
    }

    #[test]
    fn single_pixel_profile() {
        let img = Raster::filled(3, 3, 2.5);
        let mut mask = Mask::filled(3, 3, false);
        mask.set(1, 1, true);
        assert_eq!(FeretAxisProfile.profile(&img.view(), &mask), vec![2.5]);
    }
}

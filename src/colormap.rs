//! Scalar-to-color mapping for single-channel renders.
//!
//! The maps are sampled into 256-entry lookup tables and values are normalized
//! with a linear `[vmin, vmax]` range. Values outside the range saturate at the
//! ends of the map; NaN is drawn as transparent black.

use image::{Rgba, RgbaImage};
use ndarray::ArrayView2;

pub const LUT_SIZE: usize = 256;
const BAD_COLOR: Rgba<u8> = Rgba([0, 0, 0, 0]);

// Anchor points (x, value) of each channel, linearly interpolated in between
const JET_RED: &[(f32, f32)] = &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_GREEN: &[(f32, f32)] = &[(0.0, 0.0), (0.125, 0.0), (0.375, 1.0), (0.64, 1.0), (0.91, 0.0), (1.0, 0.0)];
const JET_BLUE: &[(f32, f32)] = &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

const SUMMER_RED: &[(f32, f32)] = &[(0.0, 0.0), (1.0, 1.0)];
const SUMMER_GREEN: &[(f32, f32)] = &[(0.0, 0.5), (1.0, 1.0)];
const SUMMER_BLUE: &[(f32, f32)] = &[(0.0, 0.4), (1.0, 0.4)];

const VIRIDIS_RED: &[(f32, f32)] = &[
    (0.0, 0.267), (0.125, 0.283), (0.25, 0.230), (0.375, 0.164), (0.5, 0.128),
    (0.625, 0.135), (0.75, 0.369), (0.875, 0.678), (1.0, 0.993),
];
const VIRIDIS_GREEN: &[(f32, f32)] = &[
    (0.0, 0.005), (0.125, 0.141), (0.25, 0.322), (0.375, 0.471), (0.5, 0.567),
    (0.625, 0.659), (0.75, 0.789), (0.875, 0.864), (1.0, 0.906),
];
const VIRIDIS_BLUE: &[(f32, f32)] = &[
    (0.0, 0.329), (0.125, 0.458), (0.25, 0.546), (0.375, 0.558), (0.5, 0.551),
    (0.625, 0.518), (0.75, 0.383), (0.875, 0.190), (1.0, 0.144),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Categorical-looking rainbow map used for segmentation channels
    Jet,
    /// Sequential green-yellow map used for depth and disparity
    Summer,
    /// Default map for single-channel data without a role
    Viridis,
}

impl Colormap {
    fn anchors(&self) -> [&'static [(f32, f32)]; 3] {
        match self {
            Colormap::Jet => [JET_RED, JET_GREEN, JET_BLUE],
            Colormap::Summer => [SUMMER_RED, SUMMER_GREEN, SUMMER_BLUE],
            Colormap::Viridis => [VIRIDIS_RED, VIRIDIS_GREEN, VIRIDIS_BLUE],
        }
    }

    pub fn lut(&self) -> Vec<[u8; 3]> {
        let anchors = self.anchors();
        (0..LUT_SIZE)
            .map(|i| {
                let x = i as f32 / (LUT_SIZE - 1) as f32;
                anchors.map(|channel| to_byte(interpolate(channel, x)))
            })
            .collect()
    }

    /// Color of a normalized value in `[0, 1]`.
    #[cfg(test)]
    pub fn color(&self, t: f32) -> [u8; 3] {
        self.lut()[lut_index(t)]
    }
}

fn interpolate(anchors: &[(f32, f32)], x: f32) -> f32 {
    for pair in anchors.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    anchors.last().map(|&(_, y)| y).unwrap_or(0.0)
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lut_index(t: f32) -> usize {
    ((t.clamp(0.0, 1.0) * LUT_SIZE as f32) as usize).min(LUT_SIZE - 1)
}

/// Linear mapping of data values onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f32,
    pub vmax: f32,
}

impl Normalize {
    /// Spans the finite minimum and maximum of `plane`.
    pub fn from_data(plane: &ArrayView2<f32>) -> Self {
        let (vmin, vmax) = finite_range(plane).unwrap_or((0.0, 0.0));
        Self { vmin, vmax }
    }

    /// Spans the finite minimum of `plane` up to a fixed `vmax`.
    ///
    /// Values above `vmax` saturate instead of stretching the range.
    pub fn clamped(plane: &ArrayView2<f32>, vmax: f32) -> Self {
        let vmin = finite_range(plane).map(|(min, _)| min).unwrap_or(0.0);
        Self {
            vmin: vmin.min(vmax),
            vmax,
        }
    }

    /// Normalized value, or `None` for NaN. A degenerate range maps everything to 0.
    pub fn scale(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        if self.vmax <= self.vmin {
            return Some(0.0);
        }
        Some(((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0))
    }
}

fn finite_range(plane: &ArrayView2<f32>) -> Option<(f32, f32)> {
    plane
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

/// Colors a `H x W` plane.
pub fn apply(colormap: Colormap, plane: &ArrayView2<f32>, norm: &Normalize) -> RgbaImage {
    let lut = colormap.lut();
    let (height, width) = plane.dim();

    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        match norm.scale(plane[[y as usize, x as usize]]) {
            Some(t) => {
                let [r, g, b] = lut[lut_index(t)];
                Rgba([r, g, b, 255])
            }
            None => BAD_COLOR,
        }
    })
}

/// A vertical colorbar, the top of the map at the top.
pub fn colorbar(colormap: Colormap, width: u32, height: u32) -> RgbaImage {
    let lut = colormap.lut();
    let span = height.saturating_sub(1).max(1) as f32;

    RgbaImage::from_fn(width, height, |_, y| {
        let [r, g, b] = lut[lut_index(1.0 - y as f32 / span)];
        Rgba([r, g, b, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_jet_ends() {
        assert_eq!(Colormap::Jet.color(0.0), [0, 0, 128]);
        assert_eq!(Colormap::Jet.color(1.0), [128, 0, 0]);
    }

    #[test]
    fn test_summer_ends() {
        assert_eq!(Colormap::Summer.color(0.0), [0, 128, 102]);
        assert_eq!(Colormap::Summer.color(1.0), [255, 255, 102]);
    }

    #[test]
    fn test_clamped_range_saturates() {
        let plane = array![[0.0f32, 2.5], [5.0, 40.0]];
        let norm = Normalize::clamped(&plane.view(), 5.0);
        assert_eq!(norm.vmin, 0.0);
        assert_eq!(norm.scale(40.0), Some(1.0));
        assert_eq!(norm.scale(2.5), Some(0.5));

        let image = apply(Colormap::Summer, &plane.view(), &norm);
        assert_eq!(image.get_pixel(0, 1), image.get_pixel(1, 1));
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(1, 1));
    }

    #[test]
    fn test_non_finite_values() {
        let plane = array![[1.0f32, f32::NAN], [f32::INFINITY, 3.0]];
        let norm = Normalize::from_data(&plane.view());
        assert_eq!((norm.vmin, norm.vmax), (1.0, 3.0));

        let image = apply(Colormap::Jet, &plane.view(), &norm);
        assert_eq!(image.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(image.get_pixel(0, 1), image.get_pixel(1, 1));
    }

    #[test]
    fn test_constant_plane_maps_to_low_end() {
        let plane = array![[7.0f32, 7.0]];
        let norm = Normalize::from_data(&plane.view());
        assert_eq!(norm.scale(7.0), Some(0.0));
    }

    #[test]
    fn test_colorbar_runs_top_to_bottom() {
        let bar = colorbar(Colormap::Summer, 4, 10);
        assert_eq!(bar.dimensions(), (4, 10));
        assert_eq!(bar.get_pixel(0, 0).0[..3], Colormap::Summer.color(1.0));
        assert_eq!(bar.get_pixel(0, 9).0[..3], Colormap::Summer.color(0.0));
    }
}

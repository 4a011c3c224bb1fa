//! Optical flow as a color wheel: direction is hue, magnitude is brightness.

use std::f32::consts::PI;

use ecolor::Hsva;
use ndarray::{Array3, ArrayView3};

/// Converts a `H x W x C` flow field (`C >= 2`, x then y) to `H x W x 3` rgb in `[0, 1]`.
///
/// The angle of each vector becomes the hue, its magnitude (min-max normalized
/// over the field) the value, and saturation is full.
pub fn flow_to_rgb(flow: &ArrayView3<f32>) -> Array3<f32> {
    let (height, width, _) = flow.dim();

    let mut magnitude = Array3::<f32>::zeros((height, width, 1));
    let mut hue = Array3::<f32>::zeros((height, width, 1));
    for ((y, x, _), m) in magnitude.indexed_iter_mut() {
        let (fx, fy) = (flow[[y, x, 0]], flow[[y, x, 1]]);
        *m = (fx * fx + fy * fy).sqrt();
        let mut angle = fy.atan2(fx);
        if angle < 0.0 {
            angle += 2.0 * PI;
        }
        hue[[y, x, 0]] = angle.to_degrees();
    }

    let (min, max) = magnitude
        .iter()
        .copied()
        .filter(|m| m.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), m| (lo.min(m), hi.max(m)));
    let span = max - min;

    let mut rgb = Array3::<f32>::zeros((height, width, 3));
    for y in 0..height {
        for x in 0..width {
            let m = magnitude[[y, x, 0]];
            let value = if span > 0.0 && m.is_finite() { (m - min) / span } else { 0.0 };
            let [r, g, b] = Hsva::new(hue[[y, x, 0]] / 360.0, 1.0, value, 1.0).to_rgb();
            rgb[[y, x, 0]] = r;
            rgb[[y, x, 1]] = g;
            rgb[[y, x, 2]] = b;
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_output_keeps_spatial_shape() {
        let flow = Array3::<f32>::ones((4, 7, 2));
        let rgb = flow_to_rgb(&flow.view());
        assert_eq!(rgb.dim(), (4, 7, 3));
    }

    #[test]
    fn test_direction_sets_hue() {
        let mut flow = Array3::<f32>::zeros((1, 3, 2));
        flow[[0, 1, 0]] = 2.0; // +x: red
        flow[[0, 2, 1]] = 2.0; // +y: 90 degrees, yellow-green

        let rgb = flow_to_rgb(&flow.view());
        let pixel = |x: usize| [rgb[[0, x, 0]], rgb[[0, x, 1]], rgb[[0, x, 2]]];

        assert_close(pixel(0), [0.0, 0.0, 0.0]);
        assert_close(pixel(1), [1.0, 0.0, 0.0]);
        assert_close(pixel(2), [0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_hue_wheel_thirds() {
        let mut flow = Array3::<f32>::zeros((1, 4, 2));
        let angle = |degrees: f32| (degrees.to_radians().cos(), degrees.to_radians().sin());
        for (x, degrees) in [120.0f32, 240.0, 0.0].into_iter().enumerate() {
            let (fx, fy) = angle(degrees);
            flow[[0, x + 1, 0]] = fx;
            flow[[0, x + 1, 1]] = fy;
        }

        let rgb = flow_to_rgb(&flow.view());
        let pixel = |x: usize| [rgb[[0, x, 0]], rgb[[0, x, 1]], rgb[[0, x, 2]]];

        assert_close(pixel(1), [0.0, 1.0, 0.0]);
        assert_close(pixel(2), [0.0, 0.0, 1.0]);
        assert_close(pixel(3), [1.0, 0.0, 0.0]);
    }
}

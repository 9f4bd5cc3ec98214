//! Optional noise reduction in native signal scale.
//!
//! All modes are pure and deterministic and never rescale values into a fixed
//! range; the output stays in the same native domain as the input. Edges are
//! handled by reflection.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::enums::NoiseReduction;
use crate::frame::NativeImage;

const GAUSSIAN_SIGMA: f32 = 1.0;
/// Kernel truncated at four standard deviations.
const GAUSSIAN_RADIUS: usize = 4;

const BILATERAL_RADIUS: usize = 2;
const BILATERAL_SIGMA_SPATIAL: f32 = 1.0;

pub fn apply(image: &NativeImage, mode: NoiseReduction) -> NativeImage {
    match mode {
        NoiseReduction::None => image.clone(),
        NoiseReduction::Gaussian => NativeImage::new(gaussian(image.data())),
        NoiseReduction::Median => NativeImage::new(median(image.data())),
        NoiseReduction::Bilateral => NativeImage::new(bilateral(image.data())),
    }
}

/// Mirror an out-of-range index back into `0..len` (reflect about the edge,
/// the edge sample itself repeated).
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - i - 1;
        } else {
            return i as usize;
        }
    }
}

fn gaussian_kernel() -> [f32; 2 * GAUSSIAN_RADIUS + 1] {
    let mut kernel = [0.0; 2 * GAUSSIAN_RADIUS + 1];
    for (i, weight) in kernel.iter_mut().enumerate() {
        let d = i as f32 - GAUSSIAN_RADIUS as f32;
        *weight = (-0.5 * d * d / (GAUSSIAN_SIGMA * GAUSSIAN_SIGMA)).exp();
    }
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Isotropic smoothing, σ = 1, as two separable passes.
fn gaussian(data: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = data.dim();
    let kernel = gaussian_kernel();
    let radius = GAUSSIAN_RADIUS as isize;

    let mut horizontal = Array2::zeros((rows, cols));
    horizontal
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(r, mut row)| {
            for c in 0..cols {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let cc = reflect(c as isize + k as isize - radius, cols);
                    acc += weight * data[[r, cc]];
                }
                row[c] = acc;
            }
        });

    let mut smoothed = Array2::zeros((rows, cols));
    smoothed
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(r, mut row)| {
            for c in 0..cols {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let rr = reflect(r as isize + k as isize - radius, rows);
                    acc += weight * horizontal[[rr, c]];
                }
                row[c] = acc;
            }
        });
    smoothed
}

/// 3×3 median.
fn median(data: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = data.dim();
    let mut filtered = Array2::zeros((rows, cols));
    filtered
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(r, mut row)| {
            let mut window = [0.0f32; 9];
            for c in 0..cols {
                let mut n = 0;
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        let rr = reflect(r as isize + dr, rows);
                        let cc = reflect(c as isize + dc, cols);
                        window[n] = data[[rr, cc]];
                        n += 1;
                    }
                }
                window.sort_unstable_by(f32::total_cmp);
                row[c] = window[4];
            }
        });
    filtered
}

/// Edge-preserving smoothing over a 5×5 window; the range sigma is estimated
/// from the image standard deviation, matching the common library default
/// when none is given.
fn bilateral(data: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = data.dim();
    let n = data.len() as f32;
    let mean = data.sum() / n;
    let variance = data.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let sigma_range = variance.sqrt().max(f32::EPSILON);
    let range_norm = -0.5 / (sigma_range * sigma_range);

    let radius = BILATERAL_RADIUS as isize;
    let spatial_norm = -0.5 / (BILATERAL_SIGMA_SPATIAL * BILATERAL_SIGMA_SPATIAL);
    let side = 2 * BILATERAL_RADIUS + 1;
    let mut spatial = vec![0.0f32; side * side];
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let idx = ((dr + radius) as usize) * side + (dc + radius) as usize;
            spatial[idx] = ((dr * dr + dc * dc) as f32 * spatial_norm).exp();
        }
    }

    let mut filtered = Array2::zeros((rows, cols));
    filtered
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(r, mut row)| {
            for c in 0..cols {
                let center = data[[r, c]];
                let mut acc = 0.0;
                let mut weight_sum = 0.0;
                for dr in -radius..=radius {
                    for dc in -radius..=radius {
                        let rr = reflect(r as isize + dr, rows);
                        let cc = reflect(c as isize + dc, cols);
                        let value = data[[rr, cc]];
                        let d = value - center;
                        let idx = ((dr + radius) as usize) * side + (dc + radius) as usize;
                        let weight = spatial[idx] * (d * d * range_norm).exp();
                        acc += weight * value;
                        weight_sum += weight;
                    }
                }
                row[c] = acc / weight_sum;
            }
        });
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn none_is_identity() {
        let image = NativeImage::new(array![[1.0, 2.0], [3.0, 4.0]]);
        let out = apply(&image, NoiseReduction::None);
        assert_eq!(out.data(), image.data());
    }

    #[test]
    fn reflect_mirrors_about_the_edge() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn gaussian_preserves_constant_images_and_native_scale() {
        let image = NativeImage::new(Array2::from_elem((8, 8), 1234.5));
        let out = apply(&image, NoiseReduction::Gaussian);
        // A constant image passes through unchanged; in particular nothing is
        // rescaled into [0, 1].
        for &v in out.data() {
            assert!(float_eq(v, 1234.5));
        }
    }

    #[test]
    fn gaussian_smooths_an_impulse_symmetrically() {
        let mut data = Array2::zeros((9, 9));
        data[[4, 4]] = 100.0;
        let out = gaussian(&data);
        assert!(out[[4, 4]] < 100.0);
        assert!(out[[4, 4]] > out[[4, 3]]);
        assert!(float_eq(out[[4, 3]], out[[4, 5]]));
        assert!(float_eq(out[[3, 4]], out[[5, 4]]));
        // Mass is preserved.
        assert!((out.sum() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn median_removes_an_isolated_spike() {
        let mut data = Array2::from_elem((5, 5), 10.0);
        data[[2, 2]] = 9000.0;
        let out = median(&data);
        assert_eq!(out[[2, 2]], 10.0);
    }

    #[test]
    fn bilateral_preserves_a_sharp_edge() {
        let mut data = Array2::zeros((6, 6));
        for r in 0..6 {
            for c in 3..6 {
                data[[r, c]] = 1000.0;
            }
        }
        let out = bilateral(&data);
        // The step stays close to its original levels on both sides.
        assert!(out[[3, 1]] < 100.0);
        assert!(out[[3, 4]] > 900.0);
    }

    #[test]
    fn deterministic_across_runs() {
        let image = NativeImage::new(Array2::from_shape_fn((16, 16), |(r, c)| {
            ((r * 31 + c * 17) % 97) as f32
        }));
        for mode in [
            NoiseReduction::Gaussian,
            NoiseReduction::Median,
            NoiseReduction::Bilateral,
        ] {
            let a = apply(&image, mode);
            let b = apply(&image, mode);
            assert_eq!(a.data(), b.data());
        }
    }
}

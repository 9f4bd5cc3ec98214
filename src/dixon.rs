//! The two-point Dixon numeric stages: normalization, fat-water separation,
//! contrast/brightness adjustment and display quantization.

use image::GrayImage;
use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{DixonError, Result};
use crate::frame::{DisplayImage, NativeImage, NormalizedImage};

/// Result of a min-max rescale.
///
/// A constant buffer cannot be rescaled; callers decide whether that is an
/// error (an acquisition without signal variation) or a handled case (an
/// all-zero fat estimate).
#[derive(Clone, Debug)]
pub enum NormalizeOutcome {
    Rescaled(NormalizedImage),
    Constant { value: f32 },
}

/// Linear rescale to `[0, 1]`: `(x - min) / (max - min)`.
///
/// # Errors
///
/// `InvalidInput` when the buffer is empty.
pub fn normalize(data: &Array2<f32>) -> Result<NormalizeOutcome> {
    if data.is_empty() {
        return Err(DixonError::InvalidInput("cannot normalize an empty image"));
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in data {
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        return Ok(NormalizeOutcome::Constant { value: min });
    }
    let range = max - min;
    Ok(NormalizeOutcome::Rescaled(NormalizedImage::new(
        data.mapv(|v| (v - min) / range),
    )))
}

/// Normalize an acquisition, which must carry real signal variation.
pub fn normalize_acquisition(image: &NativeImage) -> Result<NormalizedImage> {
    match normalize(image.data())? {
        NormalizeOutcome::Rescaled(normalized) => Ok(normalized),
        NormalizeOutcome::Constant { .. } => Err(DixonError::InvalidInput(
            "acquisition has no signal variation",
        )),
    }
}

/// Two-point Dixon decomposition.
///
/// The water estimate is the normalized mean signal; the fat estimate is the
/// normalized in-minus-out difference where in-phase exceeds out-phase, with
/// values below `fat_threshold` forced to exactly zero. When no pixel is
/// fat-predominant the fat buffer is all zero and is returned as-is instead
/// of failing its normalization.
pub fn separate(
    in_phase: &NormalizedImage,
    out_phase: &NormalizedImage,
    fat_threshold: f32,
) -> Result<(NormalizedImage, NormalizedImage)> {
    if in_phase.dim() != out_phase.dim() {
        return Err(DixonError::InvalidInput(
            "in-phase and out-phase dimensions disagree",
        ));
    }
    let ip = in_phase.data();
    let op = out_phase.data();

    let diff = ip - op;
    let mean = (ip + op) / 2.0;

    // Fat-predominant regions are where in-phase exceeds out-phase.
    let mut fat = Array2::zeros(ip.raw_dim());
    ndarray::Zip::from(&mut fat)
        .and(&diff)
        .and(ip)
        .and(op)
        .for_each(|f, &d, &i, &o| {
            if i > o {
                *f = d;
            }
        });

    let water = match normalize(&mean)? {
        NormalizeOutcome::Rescaled(water) => water,
        NormalizeOutcome::Constant { .. } => {
            return Err(DixonError::InvalidInput("mean signal is constant"));
        }
    };

    let mut fat = match normalize(&fat)? {
        NormalizeOutcome::Rescaled(normalized) => normalized.into_inner(),
        // No fat-predominant pixel anywhere: the all-zero buffer already is
        // a valid normalized fat image.
        NormalizeOutcome::Constant { value } if value == 0.0 => fat,
        NormalizeOutcome::Constant { .. } => {
            return Err(DixonError::InvalidInput("fat estimate is constant"));
        }
    };
    fat.mapv_inplace(|v| if v < fat_threshold { 0.0 } else { v });

    Ok((water, NormalizedImage::new(fat)))
}

/// Contrast then brightness then clip, in that fixed order.
///
/// Both amounts are in `[-1, 1]`; the contrast factor is `1 + contrast`,
/// applied centered around 0.5.
pub fn adjust(image: &NormalizedImage, contrast: f32, brightness: f32) -> NormalizedImage {
    let factor = 1.0 + contrast;
    NormalizedImage::new(
        image
            .data()
            .mapv(|v| ((v - 0.5) * factor + 0.5 + brightness).clamp(0.0, 1.0)),
    )
}

/// Display-only 8-bit conversion: `round(x * 255)`.
pub fn quantize(image: &NormalizedImage) -> DisplayImage {
    let (rows, cols) = image.dim();
    let pixels: Vec<u8> = image
        .data()
        .into_par_iter()
        .map(|&v| (v * 255.0).round() as u8)
        .collect();
    let buffer = GrayImage::from_raw(cols as u32, rows as u32, pixels)
        .expect("pixel count matches image dimensions");
    DisplayImage::new(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    fn normalized(data: Array2<f32>) -> NormalizedImage {
        NormalizedImage::new(data)
    }

    fn rescaled(data: &Array2<f32>) -> NormalizedImage {
        match normalize(data).unwrap() {
            NormalizeOutcome::Rescaled(image) => image,
            NormalizeOutcome::Constant { .. } => panic!("constant input"),
        }
    }

    #[test]
    fn normalize_spans_the_unit_interval() {
        let image = rescaled(&array![[100.0, 200.0], [150.0, 250.0]]);
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in image.data() {
            min = min.min(v);
            max = max.max(v);
        }
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn normalize_is_idempotent() {
        let data = array![[3.0, -1.5, 8.0], [0.0, 2.5, 7.25]];
        let once = rescaled(&data);
        let twice = rescaled(once.data());
        for (&a, &b) in once.data().iter().zip(twice.data()) {
            assert!(float_eq(a, b));
        }
    }

    #[test]
    fn normalize_rejects_empty_input() {
        let empty = Array2::<f32>::zeros((0, 0));
        assert!(matches!(
            normalize(&empty),
            Err(DixonError::InvalidInput(_))
        ));
    }

    #[test]
    fn normalize_reports_constant_input() {
        let constant = Array2::from_elem((4, 4), 7.0);
        assert!(matches!(
            normalize(&constant).unwrap(),
            NormalizeOutcome::Constant { value } if value == 7.0
        ));
    }

    #[test]
    fn equal_phases_yield_zero_fat_and_water_equal_to_input() {
        let x = array![[0.1, 0.6], [0.3, 1.0]];
        let (water, fat) = separate(&normalized(x.clone()), &normalized(x.clone()), 0.1).unwrap();
        assert!(fat.data().iter().all(|&v| v == 0.0));
        // mean == x, so water == normalize(x).
        let expected = rescaled(&x);
        for (&w, &e) in water.data().iter().zip(expected.data()) {
            assert!(float_eq(w, e));
        }
    }

    #[test]
    fn separation_of_fat_predominant_pair() {
        // Every pixel has in-phase > out-phase, so the mask is true
        // everywhere: diff = [[20,100],[60,140]], mean = [[90,150],[120,180]].
        let in_phase = normalized(array![[100.0, 200.0], [150.0, 250.0]]);
        let out_phase = normalized(array![[80.0, 100.0], [90.0, 110.0]]);

        let (water, fat) = separate(&in_phase, &out_phase, 0.0).unwrap();

        // Water minimum at (0,0), maximum at (1,1).
        assert_eq!(water.data()[[0, 0]], 0.0);
        assert_eq!(water.data()[[1, 1]], 1.0);
        assert!(float_eq(water.data()[[0, 1]], (150.0 - 90.0) / 90.0));
        assert!(float_eq(water.data()[[1, 0]], (120.0 - 90.0) / 90.0));

        // Fat is the normalized difference.
        assert_eq!(fat.data()[[0, 0]], 0.0);
        assert!(float_eq(fat.data()[[0, 1]], (100.0 - 20.0) / 120.0));
        assert!(float_eq(fat.data()[[1, 0]], (60.0 - 20.0) / 120.0));
        assert_eq!(fat.data()[[1, 1]], 1.0);
    }

    #[test]
    fn fat_threshold_zeroes_values_below_it() {
        let in_phase = normalized(array![[100.0, 200.0], [150.0, 250.0]]);
        let out_phase = normalized(array![[80.0, 100.0], [90.0, 110.0]]);

        let (_, fat) = separate(&in_phase, &out_phase, 0.9).unwrap();
        assert_eq!(fat.data()[[0, 0]], 0.0);
        assert_eq!(fat.data()[[0, 1]], 0.0);
        assert_eq!(fat.data()[[1, 0]], 0.0);
        assert_eq!(fat.data()[[1, 1]], 1.0);
    }

    #[test]
    fn all_water_pair_short_circuits_fat_normalization() {
        // out-phase >= in-phase everywhere, so no pixel is fat-predominant
        // and the all-zero fat buffer must come back as-is.
        let in_phase = normalized(array![[0.1, 0.2], [0.3, 0.4]]);
        let out_phase = normalized(array![[0.5, 0.6], [0.7, 0.8]]);

        let (_, fat) = separate(&in_phase, &out_phase, 0.1).unwrap();
        assert!(fat.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = normalized(Array2::zeros((2, 2)));
        let b = normalized(Array2::zeros((3, 3)));
        assert!(matches!(
            separate(&a, &b, 0.1),
            Err(DixonError::InvalidInput(_))
        ));
    }

    #[test]
    fn adjust_is_identity_at_neutral_settings() {
        let x = array![[0.0, 0.25], [0.5, 1.0]];
        let out = adjust(&normalized(x.clone()), 0.0, 0.0);
        for (&a, &b) in out.data().iter().zip(&x) {
            assert!(float_eq(a, b));
        }
    }

    #[test]
    fn adjust_applies_contrast_before_brightness_then_clips() {
        // contrast slider 50 maps to factor 2.0: (0.75-0.5)*2+0.5 = 1.0.
        let out = adjust(&normalized(array![[0.75]]), 1.0, 0.0);
        assert_eq!(out.data()[[0, 0]], 1.0);

        // Brightness is added after the contrast transform, then clipped.
        let out = adjust(&normalized(array![[0.75, 0.1]]), 1.0, 0.5);
        assert_eq!(out.data()[[0, 0]], 1.0);
        assert!(float_eq(out.data()[[0, 1]], (0.1 - 0.5) * 2.0 + 0.5 + 0.5));

        let out = adjust(&normalized(array![[0.0]]), 1.0, -0.8);
        assert_eq!(out.data()[[0, 0]], 0.0);
    }

    #[test]
    fn quantize_rounds_into_display_bytes() {
        let out = quantize(&normalized(array![[0.0, 0.5], [0.25, 1.0]]));
        assert_eq!(out.image().get_pixel(0, 0).0, [0]);
        assert_eq!(out.image().get_pixel(1, 0).0, [128]);
        assert_eq!(out.image().get_pixel(0, 1).0, [64]);
        assert_eq!(out.image().get_pixel(1, 1).0, [255]);
    }

    #[test]
    fn quantize_is_deterministic() {
        let image = rescaled(&Array2::from_shape_fn((32, 32), |(r, c)| {
            (r as f32).mul_add(0.37, c as f32 * 0.13).sin()
        }));
        let a = quantize(&image);
        let b = quantize(&image);
        assert_eq!(a.image().as_raw(), b.image().as_raw());
    }
}

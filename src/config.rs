//! Per-invocation configuration.
//!
//! Each command constructs these once and threads them through the pipeline;
//! no numeric stage reads a process-wide settings store.

use crate::enums::{ExportFormat, NoiseReduction, PlaySpeed, WindowSize};

/// Settings of the numeric stages, immutable for one pipeline invocation.
///
/// `contrast` and `brightness` hold the raw slider range `[-50, 50]`; the
/// stages consume them mapped into `[-1, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustmentConfig {
    pub fat_threshold: f32,
    pub noise_reduction: NoiseReduction,
    pub contrast: i32,
    pub brightness: i32,
}

impl AdjustmentConfig {
    pub fn new(
        fat_threshold: f32,
        noise_reduction: NoiseReduction,
        contrast: i32,
        brightness: i32,
    ) -> Self {
        AdjustmentConfig {
            fat_threshold: fat_threshold.clamp(0.0, 1.0),
            noise_reduction,
            contrast: contrast.clamp(-50, 50),
            brightness: brightness.clamp(-50, 50),
        }
    }

    /// Contrast slider value mapped into `[-1, 1]`.
    pub fn contrast_amount(&self) -> f32 {
        self.contrast as f32 / 50.0
    }

    /// Brightness slider value mapped into `[-1, 1]`.
    pub fn brightness_amount(&self) -> f32 {
        self.brightness as f32 / 50.0
    }
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        AdjustmentConfig::new(0.1, NoiseReduction::None, 0, 0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub compression: bool,
    pub gif_duration_ms: u32,
    pub gif_loop: bool,
}

impl ExportJob {
    pub fn new(format: ExportFormat, compression: bool, gif_duration_ms: u32, gif_loop: bool) -> Self {
        ExportJob {
            format,
            compression,
            gif_duration_ms: gif_duration_ms.clamp(50, 1000),
            gif_loop,
        }
    }
}

impl Default for ExportJob {
    fn default() -> Self {
        ExportJob::new(ExportFormat::Dicom, true, 500, true)
    }
}

/// Render and playback preferences. `window_size` never reaches the numeric
/// pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayConfig {
    pub window_size: WindowSize,
    pub play_speed: PlaySpeed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_values_map_to_unit_range() {
        let config = AdjustmentConfig::new(0.1, NoiseReduction::None, 50, -25);
        assert_eq!(config.contrast_amount(), 1.0);
        assert_eq!(config.brightness_amount(), -0.5);

        let neutral = AdjustmentConfig::default();
        assert_eq!(neutral.contrast_amount(), 0.0);
        assert_eq!(neutral.brightness_amount(), 0.0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = AdjustmentConfig::new(1.5, NoiseReduction::Median, 100, -100);
        assert_eq!(config.fat_threshold, 1.0);
        assert_eq!(config.contrast, 50);
        assert_eq!(config.brightness, -50);

        let job = ExportJob::new(ExportFormat::Gif, false, 10, false);
        assert_eq!(job.gif_duration_ms, 50);
        let job = ExportJob::new(ExportFormat::Gif, false, 5000, true);
        assert_eq!(job.gif_duration_ms, 1000);
    }
}

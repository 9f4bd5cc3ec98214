//! Per-frame recompute: load → filter → normalize → separate → adjust →
//! quantize. Any stage failure aborts the whole frame; no partial frame set
//! ever escapes.

use tracing::debug;

use crate::config::AdjustmentConfig;
use crate::dixon;
use crate::error::Result;
use crate::filter;
use crate::frame::{DerivedFrameSet, DisplayImage};
use crate::loader::{self, SourceObject};
use crate::scan_index::ScanPair;

/// The quantized frame set for one scan index, together with the source
/// dataset it was derived from.
pub struct FrameOutput {
    pub frames: DerivedFrameSet<DisplayImage>,
    pub source: SourceObject,
}

pub fn recompute(pair: &ScanPair, config: &AdjustmentConfig) -> Result<FrameOutput> {
    debug!(pair = %pair.in_phase_file.display(), "recomputing frame set");
    let loaded = loader::load_pair(pair)?;

    let in_phase = filter::apply(&loaded.in_phase, config.noise_reduction);
    let out_phase = filter::apply(&loaded.out_phase, config.noise_reduction);

    let in_phase = dixon::normalize_acquisition(&in_phase)?;
    let out_phase = dixon::normalize_acquisition(&out_phase)?;

    let (water, fat) = dixon::separate(&in_phase, &out_phase, config.fat_threshold)?;

    let contrast = config.contrast_amount();
    let brightness = config.brightness_amount();
    let frames = DerivedFrameSet {
        in_phase,
        out_phase,
        water,
        fat,
    }
    .map(|channel| dixon::adjust(&channel, contrast, brightness))
    .map(|channel| dixon::quantize(&channel));

    Ok(FrameOutput {
        frames,
        source: loaded.source,
    })
}

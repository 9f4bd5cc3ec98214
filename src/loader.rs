//! External DICOM codec adapter: one scan pair in, two native-scale pixel
//! buffers plus the source dataset out.

use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use dicom::pixeldata::PixelDecoder;
use ndarray::s;

use crate::error::{DixonError, Result};
use crate::frame::NativeImage;
use crate::scan_index::ScanPair;

pub type SourceObject = FileDicomObject<InMemDicomObject>;

pub struct LoadedPair {
    pub in_phase: NativeImage,
    pub out_phase: NativeImage,
    /// The in-phase dataset, kept for metadata propagation into DICOM
    /// exports. Read-only to the pipeline.
    pub source: SourceObject,
}

pub fn load_pair(pair: &ScanPair) -> Result<LoadedPair> {
    let in_object = open_file(&pair.in_phase_file)?;
    let out_object = open_file(&pair.out_phase_file)?;

    let in_phase = decode_native(&in_object)?;
    let out_phase = decode_native(&out_object)?;

    Ok(LoadedPair {
        in_phase,
        out_phase,
        source: in_object,
    })
}

/// Decode the pixel array of the first frame, first sample, as acquired.
fn decode_native(object: &SourceObject) -> Result<NativeImage> {
    let pixel_data = object.decode_pixel_data().map_err(DixonError::codec)?;
    let array = pixel_data
        .to_ndarray::<f32>()
        .map_err(DixonError::codec)?;
    Ok(NativeImage::new(array.slice_move(s![0, .., .., 0])))
}

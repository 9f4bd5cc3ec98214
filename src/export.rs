//! Per-format export of quantized frame sets.
//!
//! DICOM exports reconstruct a fresh SOP instance carrying the source
//! metadata; raster exports encode the single 8-bit channel; GIF exports
//! render the entire scan set into four independent animations. A failure
//! aborts the remaining writes but leaves already-written files on disk.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{Delay, DynamicImage, Frame};
use tracing::{debug, info};

use crate::config::{AdjustmentConfig, ExportJob};
use crate::enums::{Channel, ExportFormat};
use crate::error::{DixonError, Result};
use crate::frame::{DerivedFrameSet, DisplayImage};
use crate::loader::SourceObject;
use crate::pipeline;
use crate::scan_index::ScanSet;

const JPEG_QUALITY: u8 = 85;

pub struct Exporter;

impl Exporter {
    /// Export the four channels of one quantized frame set as still images,
    /// named `<channel>_<index>.<ext>`.
    ///
    /// Returns the written paths. A failure after the first successful write
    /// surfaces as `ExportPartialFailure`; the files already written stay on
    /// disk.
    pub fn export_frame(
        frames: &DerivedFrameSet<DisplayImage>,
        source: &SourceObject,
        index: usize,
        job: &ExportJob,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if job.format == ExportFormat::Gif {
            return Err(DixonError::InvalidInput(
                "animated export spans the scan set; use export_animation",
            ));
        }

        let mut written = Vec::new();
        for (channel, image) in frames.channels() {
            let path = out_dir.join(format!(
                "{}_{}.{}",
                channel.label(),
                index,
                job.format.extension()
            ));
            let result = match job.format {
                ExportFormat::Dicom => Self::write_dicom(image, source, &path),
                _ => Self::write_raster(image, job.format, job.compression, &path),
            };
            match result {
                Ok(()) => {
                    debug!(path = %path.display(), "wrote channel");
                    written.push(path);
                }
                Err(cause) => return Err(Self::partial(written.len(), cause)),
            }
        }
        info!(files = written.len(), dir = %out_dir.display(), "frame export complete");
        Ok(written)
    }

    /// Render every scan index through the full pipeline and encode one
    /// animation per channel, `<channel>_animation.gif`.
    ///
    /// This is a read-only pass over a snapshot of the scan set and the
    /// adjustment config; playback state is never touched, so the caller's
    /// current index survives any failure unchanged.
    pub fn export_animation(
        scans: &ScanSet,
        config: &AdjustmentConfig,
        job: &ExportJob,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if scans.is_empty() {
            return Err(DixonError::InvalidInput("no scans loaded"));
        }

        let delay = Delay::from_numer_denom_ms(job.gif_duration_ms, 1);
        let mut frames_by_channel: [Vec<Frame>; 4] = [vec![], vec![], vec![], vec![]];
        for (index, pair) in scans.iter().enumerate() {
            let output = pipeline::recompute(pair, config)?;
            debug!(index, "rendered animation frame");
            for (slot, (_, image)) in frames_by_channel
                .iter_mut()
                .zip(output.frames.channels())
            {
                let rgba = DynamicImage::ImageLuma8(image.image().clone()).into_rgba8();
                slot.push(Frame::from_parts(rgba, 0, 0, delay));
            }
        }

        let mut written = Vec::new();
        for (channel, frames) in Channel::ALL.into_iter().zip(frames_by_channel) {
            let path = out_dir.join(format!("{}_animation.gif", channel.label()));
            match Self::write_gif(frames, job.gif_loop, &path) {
                Ok(()) => {
                    info!(path = %path.display(), "wrote animation");
                    written.push(path);
                }
                Err(cause) => return Err(Self::partial(written.len(), cause)),
            }
        }
        Ok(written)
    }

    fn partial(written: usize, cause: DixonError) -> DixonError {
        if written == 0 {
            cause
        } else {
            DixonError::ExportPartialFailure {
                written,
                total: Channel::ALL.len(),
                source: Box::new(cause),
            }
        }
    }

    /// Reconstruct a standalone MR Image Storage dataset around the 8-bit
    /// buffer: fresh SOP instance UID, explicit-VR little-endian, every
    /// source element copied except pixel data and row/column counts, which
    /// are recomputed from the exported buffer.
    fn write_dicom(image: &DisplayImage, source: &SourceObject, path: &Path) -> Result<()> {
        let (width, height) = image.dimensions();
        let sop_instance_uid = new_sop_instance_uid();

        let mut object = InMemDicomObject::new_empty();
        let dataset: &InMemDicomObject = source;
        for element in dataset {
            let tag = element.header().tag;
            if tag == tags::PIXEL_DATA || tag == tags::ROWS || tag == tags::COLUMNS {
                continue;
            }
            object.put(element.clone());
        }

        let now = Local::now();
        object.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::MR_IMAGE_STORAGE),
        ));
        object.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid.as_str()),
        ));
        object.put(DataElement::new(
            tags::MODALITY,
            VR::CS,
            PrimitiveValue::from("MR"),
        ));
        object.put(DataElement::new(
            tags::CONTENT_DATE,
            VR::DA,
            PrimitiveValue::from(now.format("%Y%m%d").to_string()),
        ));
        object.put(DataElement::new(
            tags::CONTENT_TIME,
            VR::TM,
            PrimitiveValue::from(now.format("%H%M%S").to_string()),
        ));
        object.put(DataElement::new(
            tags::ROWS,
            VR::US,
            PrimitiveValue::from(height as u16),
        ));
        object.put(DataElement::new(
            tags::COLUMNS,
            VR::US,
            PrimitiveValue::from(width as u16),
        ));
        object.put(DataElement::new(
            tags::SAMPLES_PER_PIXEL,
            VR::US,
            PrimitiveValue::from(1_u16),
        ));
        object.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        object.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(8_u16),
        ));
        object.put(DataElement::new(
            tags::BITS_STORED,
            VR::US,
            PrimitiveValue::from(8_u16),
        ));
        object.put(DataElement::new(
            tags::HIGH_BIT,
            VR::US,
            PrimitiveValue::from(7_u16),
        ));
        object.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));

        let mut pixels = image.image().as_raw().clone();
        if pixels.len() % 2 != 0 {
            // OB values carry even length.
            pixels.push(0);
        }
        object.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::from(pixels),
        ));

        let file_object = object
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid(sop_instance_uid.as_str()),
            )
            .map_err(DixonError::codec)?;
        file_object.write_to_file(path)?;
        Ok(())
    }

    fn write_raster(
        image: &DisplayImage,
        format: ExportFormat,
        compression: bool,
        path: &Path,
    ) -> Result<()> {
        let gray = image.image();
        if compression {
            match format {
                ExportFormat::Jpeg => {
                    let writer = BufWriter::new(File::create(path)?);
                    gray.write_with_encoder(JpegEncoder::new_with_quality(writer, JPEG_QUALITY))?;
                }
                ExportFormat::Png => {
                    let writer = BufWriter::new(File::create(path)?);
                    gray.write_with_encoder(PngEncoder::new_with_quality(
                        writer,
                        CompressionType::Best,
                        FilterType::Adaptive,
                    ))?;
                }
                _ => gray.save(path)?,
            }
        } else {
            gray.save(path)?;
        }
        Ok(())
    }

    fn write_gif(frames: Vec<Frame>, loop_forever: bool, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = GifEncoder::new(writer);
        if loop_forever {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        encoder.encode_frames(frames)?;
        Ok(())
    }
}

/// A fresh SOP instance UID under the UUID-derived `2.25` arc.
fn new_sop_instance_uid() -> String {
    format!("2.25.{}", rand::random::<u128>())
}

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = DixonError> = std::result::Result<T, E>;

/// Error taxonomy of the Dixon pipeline.
///
/// Stage-level numeric failures (`InvalidInput`) abort the current frame's
/// recompute entirely; no partial frame set is ever surfaced.
#[derive(Debug, Error)]
pub enum DixonError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("no in-phase/out-phase pair found under {}", root.display())]
    MissingPair { root: PathBuf },

    #[error("DICOM codec error: {0}")]
    Codec(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export stopped after {written} of {total} files: {source}")]
    ExportPartialFailure {
        written: usize,
        total: usize,
        #[source]
        source: Box<DixonError>,
    },
}

impl DixonError {
    pub(crate) fn codec(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DixonError::Codec(Box::new(err))
    }
}

impl From<dicom::object::ReadError> for DixonError {
    fn from(err: dicom::object::ReadError) -> Self {
        DixonError::codec(err)
    }
}

impl From<dicom::object::WriteError> for DixonError {
    fn from(err: dicom::object::WriteError) -> Self {
        DixonError::codec(err)
    }
}

impl From<image::ImageError> for DixonError {
    fn from(err: image::ImageError) -> Self {
        DixonError::codec(err)
    }
}

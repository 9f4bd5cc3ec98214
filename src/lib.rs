//! # DICOM-dixon library
//!
//! This crate derives the four diagnostic views of a two-point Dixon MR
//! acquisition — in-phase, out-phase, water-only and fat-only — from pairs of
//! co-registered DICOM files, and exports the results as reconstructed DICOM
//! objects, still rasters or per-channel animations.

//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components to read the acquisitions and to reconstruct standalone MR
//! Image Storage datasets around the derived channels, propagating the
//! source metadata. Scan pairs are discovered from a folder tree laid out as
//! sibling `inphase/` and `outphase/` directories of `.dcm` files.
//!
//! The numeric pipeline runs per scan index: optional noise reduction in
//! native signal scale, min-max normalization into `[0, 1]`, signal-sum and
//! signal-difference fat-water separation, contrast/brightness adjustment,
//! and a display-only 8-bit quantization. Scale domains are encoded in the
//! buffer types, so a buffer from one domain cannot reach a stage expecting
//! another.
//!
//! Input files are assumed to have the following attributes:
//!  - Two-point acquisition (in-phase and out-phase only, no multi-echo)
//!  - No multiframe (always the first frame is used)
//!  - Co-registered pairs of identical dimensions
//!
//! # Examples
//!
//! ## Deriving and exporting the four channels of a scan tree
//!
//! Index a folder tree, render the first pair with a median prefilter, and
//! export all four channels as fresh DICOM objects.
//!
//! ```no_run
//! # use dicom_dixon::config::{AdjustmentConfig, DisplayConfig, ExportJob};
//! # use dicom_dixon::enums::NoiseReduction;
//! # use dicom_dixon::session::Session;
//! # use std::path::Path;
//! let adjustment = AdjustmentConfig::new(0.1, NoiseReduction::Median, 0, 0);
//! let mut session = Session::new(adjustment, DisplayConfig::default());
//! session
//!     .load_folder("scans")
//!     .expect("should have indexed the scan tree");
//! let written = session
//!     .export(&ExportJob::default(), Path::new("out"))
//!     .expect("should have exported the derived channels");
//! assert_eq!(written.len(), 4);
//! ```

pub mod config;
pub mod dixon;
pub mod enums;
pub mod error;
pub mod export;
pub mod filter;
pub mod frame;
pub mod loader;
pub mod pipeline;
pub mod player;
pub mod scan_index;
pub mod session;

pub use error::{DixonError, Result};

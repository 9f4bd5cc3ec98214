//! Discovery and pairing of in-phase/out-phase acquisitions on disk.
//!
//! The expected layout is `root/.../inphase/*.dcm` with a sibling
//! `root/.../outphase/*.dcm`. Files are paired by file stem; stems that
//! appear on only one side are reported and skipped. When no stem matches at
//! all, the two listings fall back to positional pairing so that acquisitions
//! named differently per side still load.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DixonError, Result};

/// One matched acquisition pair. Immutable once discovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanPair {
    /// Directory holding the `inphase`/`outphase` siblings.
    pub path: PathBuf,
    pub in_phase_file: PathBuf,
    pub out_phase_file: PathBuf,
}

/// Ordered, index-addressable sequence of scan pairs.
///
/// Created by [`ScanIndexer`], read-only thereafter; a reload replaces the
/// whole set. The order is directory-traversal order, not clinically
/// meaningful.
#[derive(Clone, Debug, Default)]
pub struct ScanSet {
    pairs: Vec<ScanPair>,
}

impl ScanSet {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScanPair> {
        self.pairs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanPair> {
        self.pairs.iter()
    }
}

pub struct ScanIndexer;

impl ScanIndexer {
    /// Recursively locate every directory containing both an `inphase` and an
    /// `outphase` subdirectory and pair the DICOM files within.
    ///
    /// # Errors
    ///
    /// `MissingPair` when zero pairs exist across the whole tree (callers
    /// typically report this and continue with an empty set); `Io` when the
    /// traversal itself fails, which aborts indexing.
    pub fn index(root: impl AsRef<Path>) -> Result<ScanSet> {
        let root = root.as_ref();
        let mut pairs = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|err| {
                DixonError::Io(
                    err.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory cycle")),
                )
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            let in_dir = dir.join("inphase");
            let out_dir = dir.join("outphase");
            if !in_dir.is_dir() || !out_dir.is_dir() {
                continue;
            }
            debug!(dir = %dir.display(), "found in-phase/out-phase siblings");

            let in_files = Self::dicom_files(&in_dir)?;
            let out_files = Self::dicom_files(&out_dir)?;
            if in_files.len() != out_files.len() {
                warn!(
                    dir = %dir.display(),
                    in_phase = in_files.len(),
                    out_phase = out_files.len(),
                    "file counts disagree between inphase and outphase"
                );
            }
            pairs.extend(Self::correlate(dir, in_files, out_files));
        }

        if pairs.is_empty() {
            return Err(DixonError::MissingPair {
                root: root.to_path_buf(),
            });
        }
        debug!(pairs = pairs.len(), "indexing complete");
        Ok(ScanSet { pairs })
    }

    /// `.dcm` files directly under `dir`, sorted by name.
    fn dicom_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<_> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Pair the two listings by file stem, reporting stems without a
    /// counterpart. Falls back to positional pairing when no stem matches.
    fn correlate(dir: &Path, in_files: Vec<PathBuf>, out_files: Vec<PathBuf>) -> Vec<ScanPair> {
        let mut out_by_stem: BTreeMap<OsString, PathBuf> = out_files
            .iter()
            .filter_map(|path| path.file_stem().map(|s| (s.to_os_string(), path.clone())))
            .collect();

        let mut pairs = Vec::new();
        let mut unmatched = Vec::new();
        for in_file in &in_files {
            let Some(stem) = in_file.file_stem() else {
                continue;
            };
            match out_by_stem.remove(stem) {
                Some(out_file) => pairs.push(ScanPair {
                    path: dir.to_path_buf(),
                    in_phase_file: in_file.clone(),
                    out_phase_file: out_file,
                }),
                None => unmatched.push(in_file.clone()),
            }
        }

        if pairs.is_empty() && !in_files.is_empty() && !out_files.is_empty() {
            // Sides are named differently per acquisition; pair the sorted
            // listings positionally, shorter side deciding the count.
            warn!(dir = %dir.display(), "no file stems match; pairing positionally");
            return in_files
                .into_iter()
                .zip(out_files)
                .map(|(in_phase_file, out_phase_file)| ScanPair {
                    path: dir.to_path_buf(),
                    in_phase_file,
                    out_phase_file,
                })
                .collect();
        }

        for in_file in unmatched {
            warn!(file = %in_file.display(), "in-phase file has no out-phase counterpart");
        }
        for out_file in out_by_stem.into_values() {
            warn!(file = %out_file.display(), "out-phase file has no in-phase counterpart");
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    fn scan_dir(root: &Path, name: &str) -> (PathBuf, PathBuf) {
        let dir = root.join(name);
        let in_dir = dir.join("inphase");
        let out_dir = dir.join("outphase");
        fs::create_dir_all(&in_dir).unwrap();
        fs::create_dir_all(&out_dir).unwrap();
        (in_dir, out_dir)
    }

    #[test]
    fn pairs_by_matching_stem() {
        let root = tempfile::tempdir().unwrap();
        let (in_dir, out_dir) = scan_dir(root.path(), "patient1");
        touch(&in_dir.join("slice1.dcm"));
        touch(&in_dir.join("slice2.dcm"));
        touch(&out_dir.join("slice2.dcm"));
        touch(&out_dir.join("slice1.dcm"));

        let scans = ScanIndexer::index(root.path()).unwrap();
        assert_eq!(scans.len(), 2);
        let first = scans.get(0).unwrap();
        assert_eq!(first.in_phase_file, in_dir.join("slice1.dcm"));
        assert_eq!(first.out_phase_file, out_dir.join("slice1.dcm"));
    }

    #[test]
    fn unmatched_stems_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let (in_dir, out_dir) = scan_dir(root.path(), "patient1");
        touch(&in_dir.join("a.dcm"));
        touch(&in_dir.join("b.dcm"));
        touch(&out_dir.join("a.dcm"));
        touch(&out_dir.join("c.dcm"));

        let scans = ScanIndexer::index(root.path()).unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans.get(0).unwrap().in_phase_file, in_dir.join("a.dcm"));
    }

    #[test]
    fn falls_back_to_positional_pairing() {
        let root = tempfile::tempdir().unwrap();
        let (in_dir, out_dir) = scan_dir(root.path(), "patient1");
        touch(&in_dir.join("ip_001.dcm"));
        touch(&in_dir.join("ip_002.dcm"));
        touch(&out_dir.join("op_001.dcm"));
        touch(&out_dir.join("op_002.dcm"));
        touch(&out_dir.join("op_003.dcm"));

        let scans = ScanIndexer::index(root.path()).unwrap();
        assert_eq!(scans.len(), 2);
        let second = scans.get(1).unwrap();
        assert_eq!(second.in_phase_file, in_dir.join("ip_002.dcm"));
        assert_eq!(second.out_phase_file, out_dir.join("op_002.dcm"));
    }

    #[test]
    fn missing_outphase_sibling_reports_missing_pair() {
        // Scenario: only an `inphase` subdirectory exists.
        let root = tempfile::tempdir().unwrap();
        let in_dir = root.path().join("patient1").join("inphase");
        fs::create_dir_all(&in_dir).unwrap();
        touch(&in_dir.join("slice1.dcm"));

        let result = ScanIndexer::index(root.path());
        assert!(matches!(result, Err(DixonError::MissingPair { .. })));
    }

    #[test]
    fn non_dicom_files_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        let (in_dir, out_dir) = scan_dir(root.path(), "patient1");
        touch(&in_dir.join("slice1.dcm"));
        touch(&in_dir.join("notes.txt"));
        touch(&out_dir.join("slice1.DCM"));

        let scans = ScanIndexer::index(root.path()).unwrap();
        assert_eq!(scans.len(), 1);
    }
}

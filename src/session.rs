//! Single-writer orchestration of the scan set, playback state and the last
//! rendered frame set.
//!
//! Every command takes `&mut self`: no two recomputes, and no recompute
//! concurrent with an export pass, can ever be in flight at once, and
//! playback state has exactly one writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{AdjustmentConfig, DisplayConfig, ExportJob};
use crate::enums::ExportFormat;
use crate::error::{DixonError, Result};
use crate::export::Exporter;
use crate::pipeline::{self, FrameOutput};
use crate::player::SequencePlayer;
use crate::scan_index::{ScanIndexer, ScanSet};

pub struct Session {
    scans: ScanSet,
    player: SequencePlayer,
    pub adjustment: AdjustmentConfig,
    pub display: DisplayConfig,
    last_rendered: Option<FrameOutput>,
}

impl Session {
    pub fn new(adjustment: AdjustmentConfig, display: DisplayConfig) -> Self {
        Session {
            scans: ScanSet::default(),
            player: SequencePlayer::new(display.play_speed),
            adjustment,
            display,
            last_rendered: None,
        }
    }

    pub fn scans(&self) -> &ScanSet {
        &self.scans
    }

    pub fn current_index(&self) -> usize {
        self.player.current_index()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// The most recent successfully rendered frame set, if any.
    pub fn last_rendered(&self) -> Option<&FrameOutput> {
        self.last_rendered.as_ref()
    }

    /// Replace the scan set wholesale and render the first pair.
    ///
    /// A tree without any in-phase/out-phase pair leaves the session empty
    /// and reports the condition instead of failing; every other command is
    /// then a no-op until a valid folder is loaded.
    pub fn load_folder(&mut self, root: impl AsRef<Path>) -> Result<usize> {
        match ScanIndexer::index(root) {
            Ok(scans) => {
                info!(scans = scans.len(), "scan set loaded");
                self.scans = scans;
                self.player.reset();
                self.refresh()?;
                Ok(self.scans.len())
            }
            Err(err @ DixonError::MissingPair { .. }) => {
                warn!("{err}");
                self.scans = ScanSet::default();
                self.player.reset();
                self.last_rendered = None;
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    /// Recompute the frame set for the current index. On failure the
    /// previously rendered frame set stays in place and the error is
    /// surfaced to the caller.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(pair) = self.scans.get(self.player.current_index()) else {
            return Ok(());
        };
        let output = pipeline::recompute(pair, &self.adjustment)?;
        self.last_rendered = Some(output);
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        if self.player.advance(self.scans.len()).is_some() {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn prev(&mut self) -> Result<()> {
        if self.player.previous().is_some() {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn seek(&mut self, index: usize) -> Result<()> {
        if !self.player.seek(index, self.scans.len()) {
            return Err(DixonError::InvalidInput("scan index out of range"));
        }
        self.refresh()
    }

    /// Start or stop playback; returns the tick interval when starting.
    pub fn toggle_play(&mut self) -> Option<Duration> {
        self.player.toggle(self.scans.len())
    }

    /// One playback tick: advance and recompute. The scheduler driving this
    /// must wait for the call to return before the next tick.
    pub fn tick(&mut self) -> Result<()> {
        if !self.player.is_playing() {
            return Ok(());
        }
        if self.player.advance(self.scans.len()).is_some() {
            self.refresh()?;
        }
        Ok(())
    }

    /// Export according to the job's format: still images of the current
    /// frame set, or — for GIF — four animations spanning the whole scan set.
    ///
    /// Running under `&mut self` suspends playback ticks for the duration;
    /// the animation pass reads a snapshot and leaves the current index
    /// untouched on every exit path.
    pub fn export(&mut self, job: &ExportJob, out_dir: &Path) -> Result<Vec<PathBuf>> {
        if self.scans.is_empty() {
            return Err(DixonError::InvalidInput("no scans loaded"));
        }
        if job.format == ExportFormat::Gif {
            let paths = Exporter::export_animation(&self.scans, &self.adjustment, job, out_dir)?;
            // Refresh the display state once the pass is over.
            self.refresh()?;
            return Ok(paths);
        }

        if self.last_rendered.is_none() {
            self.refresh()?;
        }
        let output = self
            .last_rendered
            .as_ref()
            .ok_or(DixonError::InvalidInput("nothing rendered"))?;
        Exporter::export_frame(
            &output.frames,
            &output.source,
            self.player.current_index(),
            job,
            out_dir,
        )
    }
}

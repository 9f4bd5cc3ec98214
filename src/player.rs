//! Playback over the scan sequence as an explicit state machine.
//!
//! The player exposes synchronous commands only; an external scheduler calls
//! [`Session::tick`](crate::session::Session::tick) at the interval returned
//! from `toggle`. Stopping is cooperative: it prevents the next tick, it does
//! not interrupt a recompute already in progress.

use std::time::Duration;

use crate::enums::PlaySpeed;

/// Tick interval at 1× speed.
pub const BASE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub speed_multiplier: f32,
    pub playing: bool,
}

/// The only writer of [`PlaybackState`] besides explicit navigation commands
/// routed through it.
#[derive(Debug)]
pub struct SequencePlayer {
    state: PlaybackState,
}

impl SequencePlayer {
    pub fn new(speed: PlaySpeed) -> Self {
        SequencePlayer {
            state: PlaybackState {
                current_index: 0,
                speed_multiplier: speed.multiplier(),
                playing: false,
            },
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Takes effect the next time playback starts.
    pub fn set_speed(&mut self, speed: PlaySpeed) {
        self.state.speed_multiplier = speed.multiplier();
    }

    /// The tick interval for the current speed.
    pub fn interval(&self) -> Duration {
        BASE_INTERVAL.div_f32(self.state.speed_multiplier)
    }

    /// Start or stop playback. Returns the tick interval when starting;
    /// starting over an empty scan set is a no-op.
    pub fn toggle(&mut self, scan_count: usize) -> Option<Duration> {
        if self.state.playing {
            self.state.playing = false;
            None
        } else if scan_count == 0 {
            None
        } else {
            self.state.playing = true;
            Some(self.interval())
        }
    }

    /// Advance to the next index. Wraps to 0 at the end of the sequence only
    /// while playing; plain navigation stops at the last index.
    pub fn advance(&mut self, scan_count: usize) -> Option<usize> {
        if scan_count == 0 {
            return None;
        }
        if self.state.current_index + 1 < scan_count {
            self.state.current_index += 1;
            Some(self.state.current_index)
        } else if self.state.playing {
            self.state.current_index = 0;
            Some(0)
        } else {
            None
        }
    }

    pub fn previous(&mut self) -> Option<usize> {
        if self.state.current_index > 0 {
            self.state.current_index -= 1;
            Some(self.state.current_index)
        } else {
            None
        }
    }

    pub fn seek(&mut self, index: usize, scan_count: usize) -> bool {
        if index < scan_count {
            self.state.current_index = index;
            true
        } else {
            false
        }
    }

    /// Back to index 0, stopped. Used when the scan set is replaced.
    pub fn reset(&mut self) {
        self.state.current_index = 0;
        self.state.playing = false;
    }
}

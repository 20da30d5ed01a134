//! Playback unit: a decoded track plus its playback state and cursor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::loader::AudioTrack;

/// Looping/volume/playing flags of an emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_looping: bool,
    /// Linear gain in 0.0..=1.0.
    pub volume: f32,
    pub is_playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_looping: false,
            volume: 1.0,
            is_playing: false,
        }
    }
}

/// Shared frame cursor.
///
/// Counts frames played since playback started and is never wrapped; readers
/// reduce it modulo the track length. Shared with an output device callback
/// when one drives the clock.
pub type FrameCursor = Arc<AtomicU64>;

/// A track bound into a playback unit.
pub struct Emitter {
    track: Arc<AudioTrack>,
    state: PlaybackState,
    cursor: FrameCursor,
    fractional: f64,
}

impl Emitter {
    pub fn new(track: Arc<AudioTrack>) -> Self {
        Self {
            track,
            state: PlaybackState::default(),
            cursor: Arc::new(AtomicU64::new(0)),
            fractional: 0.0,
        }
    }

    pub fn track(&self) -> &Arc<AudioTrack> {
        &self.track
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.state.is_looping = looping;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.state.volume = volume.clamp(0.0, 1.0);
    }

    pub fn play(&mut self) {
        self.state.is_playing = true;
    }

    pub fn stop(&mut self) {
        self.state.is_playing = false;
    }

    /// Handle to the cursor for an output device.
    pub fn cursor(&self) -> FrameCursor {
        Arc::clone(&self.cursor)
    }

    /// Frames played since playback started.
    pub fn frames_played(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Position inside the track in seconds.
    pub fn position_seconds(&self) -> f64 {
        let len = self.track.num_frames() as u64;
        let played = self.frames_played();
        let frame = if self.state.is_looping {
            played % len
        } else {
            played.min(len)
        };
        frame as f64 / self.track.sample_rate() as f64
    }

    /// Advance the cursor by wall time. Used when no device owns the clock.
    pub fn advance(&mut self, delta_seconds: f64) {
        if !self.state.is_playing || !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        let frames = delta_seconds * self.track.sample_rate() as f64 + self.fractional;
        let whole = frames.floor();
        self.fractional = frames - whole;
        self.cursor.fetch_add(whole as u64, Ordering::AcqRel);
        self.refresh();
    }

    /// Stop a one-shot emitter that ran past its end.
    pub fn refresh(&mut self) {
        if self.state.is_playing
            && !self.state.is_looping
            && self.frames_played() >= self.track.num_frames() as u64
        {
            self.state.is_playing = false;
        }
    }

    /// Fill `out` with the most recent `out.len()` frames ending at the
    /// cursor, scaled by the volume. Frames before the start of playback, or
    /// past the end of a one-shot track, are silent.
    pub fn fill_window(&self, out: &mut [f32]) {
        if !self.state.is_playing {
            out.iter_mut().for_each(|s| *s = 0.0);
            return;
        }

        let mono = self.track.mono();
        let len = mono.len() as u64;
        let end = self.frames_played();
        let n = out.len() as u64;

        for (i, slot) in out.iter_mut().enumerate() {
            let frame = end as i128 - n as i128 + i as i128;
            *slot = if frame < 0 {
                0.0
            } else if self.state.is_looping {
                mono[(frame as u64 % len) as usize] * self.state.volume
            } else if (frame as u64) < len {
                mono[frame as usize] * self.state.volume
            } else {
                0.0
            };
        }
    }
}

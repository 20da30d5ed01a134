//! Audio source: decode once, loop forever, report loudness every tick.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::analyser::{AmplitudeAnalyser, AnalyserError, AnalyserSettings};
use super::listener::{AudioListener, SilentListener};
use super::loader::{load_track, AudioError, AudioTrack};
use super::playback::{Emitter, PlaybackState};

/// Volume applied when playback starts.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// How a loaded track is played.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub looping: bool,
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            looping: true,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Progress of the asset decode.
#[derive(Debug)]
pub enum LoadState {
    /// No load requested yet.
    Unloaded,
    /// Decode running in the background.
    Pending,
    /// Track decoded and playing.
    Ready,
    /// Decode failed; the session stays silent.
    Failed(AudioError),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn error(&self) -> Option<&AudioError> {
        match self {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

type DecodeResult = Result<AudioTrack, AudioError>;

/// Owns the decoded track, its emitter, the listener and the analyser.
pub struct AudioSource {
    analyser: AmplitudeAnalyser,
    window: Vec<f32>,
    emitter: Option<Emitter>,
    listener: Box<dyn AudioListener>,
    playback: PlaybackSettings,
    state: LoadState,
    pending: Option<Receiver<DecodeResult>>,
    amplitude: f32,
}

impl AudioSource {
    /// Create a source with a headless listener.
    pub fn new(
        analyser: AnalyserSettings,
        playback: PlaybackSettings,
    ) -> Result<Self, AnalyserError> {
        let analyser = AmplitudeAnalyser::new(analyser)?;
        let window = vec![0.0; analyser.fft_size()];
        Ok(Self {
            analyser,
            window,
            emitter: None,
            listener: Box::new(SilentListener),
            playback,
            state: LoadState::Unloaded,
            pending: None,
            amplitude: 0.0,
        })
    }

    /// Replace the listener. Takes effect for the next track that starts.
    pub fn with_listener(mut self, listener: Box<dyn AudioListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Start decoding `path` on a background thread.
    ///
    /// Never fails: problems end up in [`load_state`](Self::load_state) once
    /// [`poll`](Self::poll) observes them.
    pub fn load(&mut self, path: impl AsRef<Path>) {
        let path: PathBuf = path.as_ref().to_path_buf();
        let (sender, receiver) = mpsc::channel::<DecodeResult>();

        let spawned = thread::Builder::new()
            .name("audio-decode".into())
            .spawn(move || {
                let result = load_track(&path);
                // Receiver gone means the source was dropped or reloaded
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => {
                log::debug!("audio decode started");
                self.pending = Some(receiver);
                self.state = LoadState::Pending;
            }
            Err(err) => self.fail(AudioError::IoError(err)),
        }
    }

    /// Decode `path` on the calling thread and start playback.
    pub fn load_blocking(&mut self, path: impl AsRef<Path>) -> &LoadState {
        self.pending = None;
        match load_track(path.as_ref()) {
            Ok(track) => self.start(track),
            Err(err) => self.fail(err),
        }
        &self.state
    }

    /// Bind an already decoded track and start playback.
    pub fn load_track(&mut self, track: AudioTrack) -> &LoadState {
        self.pending = None;
        self.start(track);
        &self.state
    }

    /// Apply a finished background decode, if any.
    pub fn poll(&mut self) -> &LoadState {
        let Some(receiver) = self.pending.as_ref() else {
            return &self.state;
        };

        match receiver.try_recv() {
            Ok(result) => {
                self.pending = None;
                match result {
                    Ok(track) => self.start(track),
                    Err(err) => self.fail(err),
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.fail(AudioError::LoadAborted);
            }
        }
        &self.state
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Playback flags, once a track is bound.
    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.emitter.as_ref().map(Emitter::state)
    }

    pub fn emitter(&self) -> Option<&Emitter> {
        self.emitter.as_ref()
    }

    /// Advance the playback clock unless the listener owns it.
    pub fn advance(&mut self, delta_seconds: f64) {
        let Some(emitter) = self.emitter.as_mut() else {
            return;
        };
        if self.listener.drives_clock() {
            emitter.refresh();
        } else {
            emitter.advance(delta_seconds);
        }
    }

    /// Sample the current loudness. 0.0 while nothing is playing.
    pub fn amplitude(&mut self) -> f32 {
        self.amplitude = match self.emitter.as_ref() {
            Some(emitter) if emitter.state().is_playing => {
                emitter.fill_window(&mut self.window);
                self.analyser.analyse(&self.window)
            }
            _ => 0.0,
        };
        self.amplitude
    }

    /// Amplitude computed by the last [`amplitude`](Self::amplitude) call.
    pub fn last_amplitude(&self) -> f32 {
        self.amplitude
    }

    fn start(&mut self, track: AudioTrack) {
        let mut emitter = Emitter::new(Arc::new(track));
        emitter.set_loop(self.playback.looping);
        emitter.set_volume(self.playback.volume);
        emitter.play();

        if let Err(err) = self.listener.attach(&emitter) {
            log::warn!("audio output unavailable, continuing silently: {}", err);
            self.listener = Box::new(SilentListener);
        }

        self.analyser.reset();
        self.emitter = Some(emitter);
        self.state = LoadState::Ready;
        log::info!(
            "audio playback started (loop: {}, volume: {})",
            self.playback.looping,
            self.playback.volume
        );
    }

    fn fail(&mut self, err: AudioError) {
        log::warn!("audio load failed: {}", err);
        if self.emitter.take().is_some() {
            self.listener.detach();
        }
        self.state = LoadState::Failed(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::{generate_sine, mono_track};

    fn source() -> AudioSource {
        AudioSource::new(AnalyserSettings::default(), PlaybackSettings::default()).unwrap()
    }

    #[test]
    fn test_amplitude_before_load_is_zero() {
        let mut source = source();
        assert!(matches!(source.load_state(), LoadState::Unloaded));
        assert_eq!(source.amplitude(), 0.0);
        assert!(source.playback_state().is_none());
    }

    #[test]
    fn test_track_starts_looping_at_half_volume() {
        let mut source = source();
        let track = mono_track(generate_sine(440.0, 8000, 0.5, 0.5), 8000).unwrap();
        assert!(source.load_track(track).is_ready());

        let state = source.playback_state().unwrap();
        assert!(state.is_looping);
        assert!(state.is_playing);
        assert_eq!(state.volume, 0.5);
    }

    #[test]
    fn test_tone_produces_amplitude() {
        let mut source = source();
        let track = mono_track(generate_sine(1000.0, 8000, 0.5, 0.9), 8000).unwrap();
        source.load_track(track);
        source.advance(0.1);
        let amplitude = source.amplitude();
        assert!(amplitude > 0.0);
        assert_eq!(source.last_amplitude(), amplitude);
    }

    #[test]
    fn test_missing_file_fails_silently() {
        let mut source = source();
        let state = source.load_blocking("/nope/missing.wav");
        assert!(matches!(state, LoadState::Failed(AudioError::IoError(_))));
        source.advance(0.1);
        assert_eq!(source.amplitude(), 0.0);
    }

    #[test]
    fn test_failed_reload_stops_previous_track() {
        let mut source = source();
        let track = mono_track(generate_sine(1000.0, 8000, 0.5, 0.9), 8000).unwrap();
        source.load_track(track);
        source.advance(0.1);
        assert!(source.amplitude() > 0.0);

        let state = source.load_blocking("/nope/missing.wav");
        assert!(matches!(state, LoadState::Failed(_)));
        assert!(!source.is_ready());
        assert!(source.playback_state().is_none());
        source.advance(0.1);
        assert_eq!(source.amplitude(), 0.0);
    }

    #[test]
    fn test_background_load_failure_is_observed_by_poll() {
        let mut source = source();
        source.load("/nope/missing.mp3");
        assert!(source.load_state().is_pending() || source.load_state().error().is_some());

        let mut attempts = 0;
        while source.poll().is_pending() && attempts < 500 {
            std::thread::sleep(std::time::Duration::from_millis(2));
            attempts += 1;
        }
        assert!(source.load_state().error().is_some());
    }
}

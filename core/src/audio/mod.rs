//! Audio decoding, playback, and loudness analysis.
//!
//! This module provides:
//! - Asset decoding via Symphonia (WAV, MP3, FLAC, AAC)
//! - A looping playback unit with an explicit listener
//! - A small-window FFT loudness estimate via RustFFT

pub mod analyser;
pub mod listener;
pub mod loader;
pub mod playback;
pub mod source;
pub mod synth;

pub use analyser::{AmplitudeAnalyser, AnalyserError, AnalyserSettings};
#[cfg(feature = "device-output")]
pub use listener::DeviceListener;
pub use listener::{AudioListener, SilentListener};
pub use loader::{load_track, AudioError, AudioTrack};
pub use playback::{Emitter, PlaybackState};
pub use source::{AudioSource, LoadState, PlaybackSettings, DEFAULT_VOLUME};
pub use synth::{generate_silence, generate_sine, generate_white_noise, mono_track};

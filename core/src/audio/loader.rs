//! Audio asset decoding using Symphonia.
//!
//! Supports WAV, MP3, FLAC, and AAC formats.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

/// Errors that can occur while loading or playing audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decode audio: {0}")]
    DecodeError(#[from] symphonia::core::errors::Error),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Decoded track contains no samples")]
    EmptyTrack,

    #[error("Audio load was aborted before completing")]
    LoadAborted,

    #[error("Audio output error: {0}")]
    Output(String),
}

/// A fully decoded audio track.
///
/// Immutable once built; the mono downmix is computed at decode time because
/// both the analyser and the device output read it every tick.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Interleaved audio samples (f32, normalized to -1.0..1.0)
    samples: Vec<f32>,
    /// Per-frame average of all channels
    mono: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

impl AudioTrack {
    /// Build a track from interleaved samples.
    pub fn from_interleaved(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: usize,
    ) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::UnknownSampleRate);
        }
        let channels = channels.max(1);
        if samples.len() < channels {
            return Err(AudioError::EmptyTrack);
        }

        let mono = if channels == 1 {
            samples.clone()
        } else {
            samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        Ok(Self {
            samples,
            mono,
            sample_rate,
            channels,
        })
    }

    /// Interleaved samples as decoded.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mono downmix, one sample per frame.
    pub fn mono(&self) -> &[f32] {
        &self.mono
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.mono.len()
    }

    /// Duration of the track in seconds.
    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file into an [`AudioTrack`].
///
/// # Example
///
/// ```no_run
/// use sonomesh::audio::loader::load_track;
/// use std::path::Path;
///
/// let track = load_track(Path::new("song.mp3")).unwrap();
/// println!("Duration: {:.2}s", track.duration());
/// ```
pub fn load_track(path: &Path) -> Result<AudioTrack, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt packets are skipped, the rest of the stream still plays
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::debug!("skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = &mut sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let track = AudioTrack::from_interleaved(samples, sample_rate, channels)?;
    log::info!(
        "decoded {} ({:.2}s, {}Hz, {} ch)",
        path.display(),
        track.duration(),
        track.sample_rate(),
        track.channels()
    );
    Ok(track)
}

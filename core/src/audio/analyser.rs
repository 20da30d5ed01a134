//! Coarse loudness estimate from a small rolling FFT window.
//!
//! The analyser follows the classic "byte frequency data" model used by
//! browser audio analysers: a Blackman-windowed FFT over a tiny window,
//! exponential smoothing across calls, decibel conversion, and a linear
//! mapping of a decibel range onto 0..=255. The amplitude is the mean of
//! those byte values.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

/// Default analysis window in samples.
pub const DEFAULT_FFT_SIZE: usize = 32;
/// Default weight of the previous smoothed magnitude.
pub const DEFAULT_SMOOTHING: f32 = 0.8;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

/// Errors for invalid analyser settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyserError {
    #[error("FFT size must be a power of 2 and at least 2, got {0}")]
    InvalidFftSize(usize),
    #[error("Smoothing must be in 0.0..1.0, got {0}")]
    InvalidSmoothing(f32),
    #[error("Decibel range is empty: min {min} >= max {max}")]
    InvalidDecibelRange { min: f32, max: f32 },
}

/// Analyser settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
        }
    }
}

impl AnalyserSettings {
    pub fn validate(&self) -> Result<(), AnalyserError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(AnalyserError::InvalidFftSize(self.fft_size));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(AnalyserError::InvalidSmoothing(self.smoothing));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(AnalyserError::InvalidDecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        Ok(())
    }
}

/// Rolling loudness analyser.
pub struct AmplitudeAnalyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl AmplitudeAnalyser {
    /// Create an analyser. All buffers are allocated here so that
    /// [`analyse`](Self::analyse) never allocates.
    pub fn new(settings: AnalyserSettings) -> Result<Self, AnalyserError> {
        settings.validate()?;
        let n = settings.fft_size;

        let fft = FftPlanner::new().plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Blackman window, alpha = 0.16
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
                    + 0.08 * (4.0 * std::f32::consts::PI * x).cos()
            })
            .collect();

        Ok(Self {
            settings,
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); n],
            scratch,
            smoothed: vec![0.0; n / 2],
            bytes: vec![0; n / 2],
        })
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    /// Number of samples consumed per analysis.
    pub fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    /// Number of frequency bins produced (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Byte-scaled bins from the most recent analysis.
    pub fn byte_frequency_data(&self) -> &[u8] {
        &self.bytes
    }

    /// Forget smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }

    /// Analyse one window and return the mean byte value.
    ///
    /// `window` shorter than the FFT size is zero-padded at the front, so the
    /// most recent samples always line up with the end of the window.
    pub fn analyse(&mut self, window: &[f32]) -> f32 {
        let n = self.settings.fft_size;
        let take = window.len().min(n);
        let pad = n - take;
        let recent = &window[window.len() - take..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let k = self.settings.smoothing;
        let scale = 1.0 / n as f32;
        let range = self.settings.max_decibels - self.settings.min_decibels;

        let mut sum = 0u32;
        for (bin, (smoothed, byte)) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .enumerate()
        {
            let magnitude = self.buffer[bin].norm() * scale;
            *smoothed = k * *smoothed + (1.0 - k) * magnitude;

            *byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                let scaled = 255.0 * (db - self.settings.min_decibels) / range;
                scaled.clamp(0.0, 255.0) as u8
            } else {
                0
            };
            sum += *byte as u32;
        }

        sum as f32 / self.bytes.len() as f32
    }
}

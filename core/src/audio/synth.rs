//! Synthetic test signals.
//!
//! Used by tests, benches and the demo to build tracks without shipping
//! audio assets.

use std::f32::consts::PI;

use super::loader::{AudioError, AudioTrack};

/// Generate a mono sine wave.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `amplitude` - Amplitude (0.0 to 1.0)
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generate white noise with a reproducible LCG.
pub fn generate_white_noise(
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;

    let mut state = seed;
    let a: u64 = 6364136223846793005;
    let c: u64 = 1442695040888963407;

    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(a).wrapping_add(c);
            let normalized = (state as f32 / u64::MAX as f32) * 2.0 - 1.0;
            amplitude * normalized
        })
        .collect()
}

/// Digital silence.
pub fn generate_silence(sample_rate: u32, duration: f32) -> Vec<f32> {
    vec![0.0; (duration * sample_rate as f32) as usize]
}

/// Wrap mono samples into a track.
pub fn mono_track(samples: Vec<f32>, sample_rate: u32) -> Result<AudioTrack, AudioError> {
    AudioTrack::from_interleaved(samples, sample_rate, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_length_and_peak() {
        let samples = generate_sine(440.0, 44100, 0.5, 0.8);
        assert_eq!(samples.len(), 22050);
        let peak = samples.iter().cloned().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.8 + 1e-6);
        assert!(peak > 0.79);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let a = generate_white_noise(8000, 0.1, 1.0, 7);
        let b = generate_white_noise(8000, 0.1, 1.0, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_silence_track() {
        let track = mono_track(generate_silence(8000, 0.25), 8000).unwrap();
        assert_eq!(track.num_frames(), 2000);
        assert!(track.mono().iter().all(|&s| s == 0.0));
    }
}

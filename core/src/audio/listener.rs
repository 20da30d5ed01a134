//! Listeners consume a playing emitter.
//!
//! The listener decides who owns the playback clock: a headless listener
//! leaves it to the render loop, an output device advances it from its
//! callback.

use super::loader::AudioError;
use super::playback::Emitter;

/// Consumer of an emitter's output.
pub trait AudioListener {
    /// Start rendering `emitter`. Called once when playback begins.
    fn attach(&mut self, emitter: &Emitter) -> Result<(), AudioError>;

    /// Stop rendering the attached emitter, if any.
    fn detach(&mut self) {}

    /// Whether this listener advances the emitter cursor itself.
    fn drives_clock(&self) -> bool;
}

/// Headless listener. Produces no sound; the render loop advances the
/// emitter by each tick's delta.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentListener;

impl AudioListener for SilentListener {
    fn attach(&mut self, _emitter: &Emitter) -> Result<(), AudioError> {
        Ok(())
    }

    fn drives_clock(&self) -> bool {
        false
    }
}

#[cfg(feature = "device-output")]
pub use device::DeviceListener;

#[cfg(feature = "device-output")]
mod device {
    use std::sync::atomic::Ordering;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::{AudioError, AudioListener, Emitter};

    /// Streams the emitter's mono downmix to the default output device.
    #[derive(Default)]
    pub struct DeviceListener {
        /// Kept alive for as long as the listener lives.
        stream: Option<cpal::Stream>,
    }

    impl DeviceListener {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl AudioListener for DeviceListener {
        fn attach(&mut self, emitter: &Emitter) -> Result<(), AudioError> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| AudioError::Output("No audio output device found".into()))?;
            let supported = device
                .default_output_config()
                .map_err(|e| AudioError::Output(format!("Failed to get audio config: {}", e)))?;

            let channels = supported.channels() as usize;
            let device_rate = supported.sample_rate().0;
            log::info!(
                "audio output: {} @ {}Hz",
                device.name().unwrap_or_else(|_| "Unknown".to_string()),
                device_rate
            );

            let track = emitter.track().clone();
            let cursor = emitter.cursor();
            let state = emitter.state();
            let step = track.sample_rate() as f64 / device_rate as f64;
            let len = track.num_frames() as u64;
            let mut position = cursor.load(Ordering::Acquire) as f64;

            let stream = device
                .build_output_stream(
                    &supported.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mono = track.mono();
                        for frame in data.chunks_mut(channels) {
                            let index = position as u64;
                            let sample = if state.is_looping {
                                mono[(index % len) as usize] * state.volume
                            } else if index < len {
                                mono[index as usize] * state.volume
                            } else {
                                0.0
                            };
                            frame.iter_mut().for_each(|s| *s = sample);
                            position += step;
                        }
                        cursor.store(position as u64, Ordering::Release);
                    },
                    |err| log::error!("audio stream error: {}", err),
                    None,
                )
                .map_err(|e| AudioError::Output(format!("Failed to build audio stream: {}", e)))?;

            stream
                .play()
                .map_err(|e| AudioError::Output(format!("Failed to start audio stream: {}", e)))?;

            self.stream = Some(stream);
            Ok(())
        }

        fn detach(&mut self) {
            if self.stream.take().is_some() {
                log::debug!("audio output stream closed");
            }
        }

        fn drives_clock(&self) -> bool {
            self.stream.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::{generate_silence, mono_track};
    use std::sync::Arc;

    #[test]
    fn test_silent_listener_leaves_clock_to_caller() {
        let track = Arc::new(mono_track(generate_silence(100, 1.0), 100).unwrap());
        let emitter = Emitter::new(track);
        let mut listener = SilentListener;
        assert!(listener.attach(&emitter).is_ok());
        assert!(!listener.drives_clock());
    }
}

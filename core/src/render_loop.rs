//! Per-tick driver.
//!
//! The host calls [`RenderLoop::tick`] once per display refresh. Each tick
//! samples the audio, pushes the rescaled amplitude and elapsed time into the
//! material, rotates the mesh and hands everything to a [`SceneRenderer`],
//! which draws the scene and runs the motion-blur compositor.
//!
//! The loop does no timing of its own; it stops when the host stops ticking.

use glam::Vec3;

use crate::audio::AudioSource;
use crate::compositor::CompositorError;
use crate::gpu::GpuError;
use crate::transform::{MeshTransform, RotationMode, DEFAULT_INITIAL_ROTATION};
use crate::uniforms::{ShaderMaterial, UniformBinder, UniformError};

/// Errors raised while setting up or drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Material does not satisfy the shader: {0}")]
    Uniform(#[from] UniformError),
    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),
    #[error("Frame readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
}

/// Draws one frame from the material's current uniform values.
///
/// Implementations render the scene into their current-frame buffer and run
/// the compositor before returning.
pub trait SceneRenderer {
    fn draw(
        &mut self,
        material: &ShaderMaterial,
        transform: &MeshTransform,
    ) -> Result<(), RenderError>;
}

/// Lifecycle of the loop. `start` is the timestamp of the first tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopState {
    Idle,
    Running { start: f64, ticks: u64 },
}

/// What a tick computed and bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// 1 for the first tick.
    pub tick: u64,
    pub elapsed_seconds: f32,
    /// Raw analyser output, 0..=255.
    pub amplitude: f32,
    /// Value written to the audio uniform.
    pub audio_uniform: f32,
    pub rotation: Vec3,
}

pub struct RenderLoop<R> {
    audio: AudioSource,
    material: ShaderMaterial,
    binder: UniformBinder,
    transform: MeshTransform,
    rotation: RotationMode,
    renderer: R,
    state: LoopState,
}

impl<R: SceneRenderer> RenderLoop<R> {
    /// `binder` must have been attached to `material`.
    pub fn new(
        audio: AudioSource,
        material: ShaderMaterial,
        binder: UniformBinder,
        renderer: R,
    ) -> Self {
        Self {
            audio,
            material,
            binder,
            transform: MeshTransform::new(DEFAULT_INITIAL_ROTATION),
            rotation: RotationMode::default(),
            renderer,
            state: LoopState::Idle,
        }
    }

    pub fn with_initial_rotation(mut self, rotation: Vec3) -> Self {
        self.transform = MeshTransform::new(rotation);
        self
    }

    pub fn with_rotation_mode(mut self, mode: RotationMode) -> Self {
        self.rotation = mode;
        self
    }

    /// Run one tick.
    ///
    /// `timestamp_seconds` is the host's monotonic clock; the time uniform
    /// is measured from the first tick's timestamp. `delta_seconds` advances
    /// headless playback and, in `PerSecond` mode, rotation.
    pub fn tick(
        &mut self,
        timestamp_seconds: f64,
        delta_seconds: f64,
    ) -> Result<TickReport, RenderError> {
        let (start, ticks) = match self.state {
            LoopState::Idle => {
                log::debug!("render loop started at t={:.3}s", timestamp_seconds);
                (timestamp_seconds, 0)
            }
            LoopState::Running { start, ticks } => (start, ticks),
        };
        let tick = ticks + 1;
        self.state = LoopState::Running { start, ticks: tick };

        self.audio.poll();
        self.audio.advance(delta_seconds);

        let amplitude = self.audio.amplitude();
        let audio_uniform = self.binder.push_amplitude(&mut self.material, amplitude);

        self.transform.advance(self.rotation.increment(delta_seconds));

        let elapsed_seconds = (timestamp_seconds - start) as f32;
        self.binder.push_time(&mut self.material, elapsed_seconds);

        log::trace!(
            "tick {}: amplitude {:.2} -> {:.4}, t={:.3}s",
            tick,
            amplitude,
            audio_uniform,
            elapsed_seconds
        );

        self.renderer.draw(&self.material, &self.transform)?;

        Ok(TickReport {
            tick,
            elapsed_seconds,
            amplitude,
            audio_uniform,
            rotation: self.transform.rotation,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        match self.state {
            LoopState::Idle => 0,
            LoopState::Running { ticks, .. } => ticks,
        }
    }

    pub fn audio(&self) -> &AudioSource {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioSource {
        &mut self.audio
    }

    pub fn material(&self) -> &ShaderMaterial {
        &self.material
    }

    pub fn transform(&self) -> &MeshTransform {
        &self.transform
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation
    }

    pub fn set_rotation_mode(&mut self, mode: RotationMode) {
        self.rotation = mode;
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

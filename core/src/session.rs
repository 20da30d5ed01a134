//! Wiring a [`VisualizerConfig`] into a running [`RenderLoop`].

use glam::Vec3;

use crate::audio::{AnalyserError, AudioError, AudioSource};
use crate::config::{ConfigError, VisualizerConfig};
use crate::gpu::{GpuError, MeshRenderer};
use crate::render_loop::{RenderError, RenderLoop};
use crate::uniforms::{ShaderMaterial, UniformBinder, UniformError};

/// Errors that can occur while setting up a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Analyser error: {0}")]
    Analyser(#[from] AnalyserError),
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Uniform error: {0}")]
    Uniform(#[from] UniformError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Build the audio source, material and GPU renderer described by `config`.
///
/// When `config.audio.path` is set the decode starts in the background; the
/// loop binds amplitude 0 until it finishes. A failed decode never aborts the
/// session.
pub async fn build_render_loop(
    config: &VisualizerConfig,
) -> Result<RenderLoop<MeshRenderer>, SessionError> {
    config.validate()?;

    let mut audio = AudioSource::new(config.audio.analyser, config.audio.playback)?;
    if let Some(path) = &config.audio.path {
        log::info!("Loading audio: {}", path.display());
        audio.load(path);
    }

    let mut material = ShaderMaterial::new();
    let binder = UniformBinder::attach(&mut material, &config.uniforms, config.audio.normalization)?;

    let renderer = MeshRenderer::new(config.to_render_config()?, &material).await?;

    Ok(RenderLoop::new(audio, material, binder, renderer)
        .with_initial_rotation(Vec3::from_array(config.motion.initial_rotation))
        .with_rotation_mode(config.motion.rotation))
}

/// [`build_render_loop`] for hosts without an async runtime.
pub fn build_render_loop_blocking(
    config: &VisualizerConfig,
) -> Result<RenderLoop<MeshRenderer>, SessionError> {
    pollster::block_on(build_render_loop(config))
}

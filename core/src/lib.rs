//! Sonomesh Core
//!
//! Audio-reactive icosphere with accumulation motion blur.
//!
//! # Features
//!
//! - Audio loading (WAV, MP3, FLAC, AAC) via Symphonia, looped playback
//! - Small-window FFT loudness via RustFFT, bound to a shader uniform
//! - Headless GPU rendering via wgpu with a blend/save/output compositor
//! - Optional device output via cpal (when `device-output` is enabled)

pub mod audio;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod gpu;
pub mod mesh;
pub mod render_loop;
pub mod session;
pub mod transform;
pub mod uniforms;

// Re-export commonly used types
pub use audio::{
    load_track, AmplitudeAnalyser, AnalyserSettings, AudioError, AudioSource, AudioTrack,
    LoadState, PlaybackSettings, PlaybackState,
};
pub use compositor::{
    CompositeTarget, CpuFrameTargets, Frame, FrameCompositor, PassChain, Stage,
    DEFAULT_BLEND_RATIO,
};
pub use config::{ConfigError, VisualizerConfig};
pub use gpu::{GpuContext, GpuError, MeshRenderer, RenderConfig};
pub use render_loop::{LoopState, RenderError, RenderLoop, SceneRenderer, TickReport};
pub use session::{build_render_loop, build_render_loop_blocking, SessionError};
pub use transform::{MeshTransform, RotationMode};
pub use uniforms::{ShaderMaterial, UniformBinder, UniformError, UniformHandle, UniformNames};

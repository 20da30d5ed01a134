//! GPU rendering using wgpu.
//!
//! Renders the audio-reactive icosphere headlessly into linear float
//! targets, composites the motion blur on the GPU and reads the presented
//! frame back to the CPU.

pub mod composite;
pub mod context;
pub mod layouts;
pub mod mesh_pipeline;
pub mod pipelines;
pub mod renderer;
pub mod textures;

pub use composite::{CompositePipeline, GpuCompositePass, GpuFrameTargets};
pub use context::{GpuContext, GpuError};
pub use mesh_pipeline::{MeshPipeline, MeshUniforms};
pub use renderer::{MeshRenderer, RenderConfig};
pub use textures::{ReadbackBuffer, RenderTarget};

//! Headless icosphere renderer with accumulation blur.

use glam::Mat4;
use wgpu::BindGroup;

use super::{
    composite::{CompositePipeline, GpuCompositePass, GpuFrameTargets},
    context::GpuContext,
    mesh_pipeline::{MeshPipeline, MeshUniforms},
    textures::{ReadbackBuffer, RenderTarget},
};
use crate::camera::CameraConfig;
use crate::compositor::{FrameCompositor, PassChain, DEFAULT_BLEND_RATIO};
use crate::mesh::{icosphere, MeshConfig};
use crate::render_loop::{RenderError, SceneRenderer};
use crate::transform::MeshTransform;
use crate::uniforms::{ShaderMaterial, UniformHandle, UniformNames};

/// Configuration for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: [f32; 3],
    pub blend_ratio: f32,
    pub mesh: MeshConfig,
    pub camera: CameraConfig,
    pub uniforms: UniformNames,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: [0.0, 0.0, 0.0],
            blend_ratio: DEFAULT_BLEND_RATIO,
            mesh: MeshConfig::default(),
            camera: CameraConfig::default(),
            uniforms: UniformNames::default(),
        }
    }
}

/// Draws the mesh into the scene target and composites it into the output.
pub struct MeshRenderer {
    ctx: GpuContext,
    mesh: MeshPipeline,
    mesh_bind_group: BindGroup,
    depth: RenderTarget,
    composite: CompositePipeline,
    targets: GpuFrameTargets,
    compositor: FrameCompositor,
    readback: ReadbackBuffer,
    view_proj: Mat4,
    time: UniformHandle,
    audio: UniformHandle,
    config: RenderConfig,
}

impl MeshRenderer {
    /// Create a renderer on a fresh GPU context.
    ///
    /// Fails if `material` has no slot for one of the shader's uniforms.
    pub async fn new(config: RenderConfig, material: &ShaderMaterial) -> Result<Self, RenderError> {
        resolve_uniforms(&config.uniforms, material)?;
        let ctx = GpuContext::new().await?;
        Self::with_context(ctx, config, material)
    }

    pub fn with_context(
        ctx: GpuContext,
        config: RenderConfig,
        material: &ShaderMaterial,
    ) -> Result<Self, RenderError> {
        let (time, audio) = resolve_uniforms(&config.uniforms, material)?;

        let compositor = FrameCompositor::with_chain(PassChain::default(), config.blend_ratio)?;

        let geometry = icosphere(&config.mesh);
        let mesh = MeshPipeline::new(&ctx.device, &geometry);
        let mesh_bind_group = mesh.create_bind_group(&ctx.device);

        let depth = RenderTarget::depth(&ctx.device, "depth_target", config.width, config.height);
        let composite = CompositePipeline::new(&ctx.device);
        let targets = GpuFrameTargets::new(&ctx.device, config.width, config.height);
        let readback = ReadbackBuffer::new(&ctx.device, config.width, config.height);

        let aspect = config.width as f32 / config.height.max(1) as f32;
        let view_proj = config.camera.view_projection(aspect);

        log::info!(
            "Mesh renderer ready: {}x{}, blend ratio {}",
            config.width,
            config.height,
            config.blend_ratio
        );

        Ok(Self {
            ctx,
            mesh,
            mesh_bind_group,
            depth,
            composite,
            targets,
            compositor,
            readback,
            view_proj,
            time,
            audio,
            config,
        })
    }

    /// Copy the presented frame to the CPU as tightly packed RGBA8.
    pub fn read_frame(&self) -> Result<Vec<u8>, RenderError> {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        self.readback
            .copy_from(&mut encoder, self.targets.output().texture());
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        Ok(self.readback.read_pixels(&self.ctx.device)?)
    }

    /// Forget the blur history; the next frame is presented unblended.
    pub fn reset_history(&mut self) {
        self.compositor.reset();
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    /// Get the render configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Get GPU adapter info.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }
}

fn resolve_uniforms(
    names: &UniformNames,
    material: &ShaderMaterial,
) -> Result<(UniformHandle, UniformHandle), RenderError> {
    let handles = material.require([names.time.as_str(), names.audio.as_str()])?;
    Ok((handles[0], handles[1]))
}

impl SceneRenderer for MeshRenderer {
    fn draw(
        &mut self,
        material: &ShaderMaterial,
        transform: &MeshTransform,
    ) -> Result<(), RenderError> {
        let uniforms = MeshUniforms {
            model: transform.model_matrix().to_cols_array_2d(),
            view_proj: self.view_proj.to_cols_array_2d(),
            time: material.value(self.time),
            audio_frequency: material.value(self.audio),
            _padding: [0.0; 2],
        };
        self.ctx
            .queue
            .write_buffer(&self.mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let [r, g, b] = self.config.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.targets.scene().view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.mesh.pipeline);
            render_pass.set_bind_group(0, &self.mesh_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.mesh.index_count, 0, 0..1);
        }

        let mut pass = GpuCompositePass {
            device: &self.ctx.device,
            queue: &self.ctx.queue,
            encoder: &mut encoder,
            pipeline: &self.composite,
            targets: &self.targets,
        };
        self.compositor.composite(&mut pass);

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

//! GPU side of the accumulation blur.
//!
//! Scene, history and scratch are linear float targets of the same size so
//! save and seed are plain texture copies. Blend and output are fullscreen
//! passes from `composite.wgsl`.

use wgpu::{
    BindGroup, BindGroupLayout, Buffer, CommandEncoder, Device, Queue, RenderPipeline, Sampler,
    TextureView,
};

use super::layouts::create_composite_layout;
use super::pipelines::{create_pipeline_layout, RenderPipelineBuilder};
use super::textures::{RenderTarget, LINEAR_FORMAT, OUTPUT_FORMAT};
use crate::compositor::CompositeTarget;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeParams {
    mix_ratio: f32,
    _padding: [f32; 3],
}

/// Pipelines and shared resources for the blend and output passes.
pub struct CompositePipeline {
    blend_pipeline: RenderPipeline,
    copy_pipeline: RenderPipeline,
    layout: BindGroupLayout,
    params: Buffer,
    sampler: Sampler,
}

impl CompositePipeline {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let layout = create_composite_layout(device);
        let pipeline_layout = create_pipeline_layout(device, "composite_pipeline_layout", &[&layout]);

        let blend_pipeline = RenderPipelineBuilder::new("blend_pipeline", &shader)
            .layout(&pipeline_layout)
            .fragment_entry("fs_blend")
            .format(LINEAR_FORMAT)
            .build(device);

        let copy_pipeline = RenderPipelineBuilder::new("output_pipeline", &shader)
            .layout(&pipeline_layout)
            .fragment_entry("fs_copy")
            .format(OUTPUT_FORMAT)
            .build(device);

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("composite_params"),
            size: std::mem::size_of::<CompositeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Targets are sampled 1:1, nearest keeps texels exact
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            blend_pipeline,
            copy_pipeline,
            layout,
            params,
            sampler,
        }
    }

    fn bind_group(&self, device: &Device, current: &TextureView, history: &TextureView) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(current),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(history),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Scene (C), history (A), scratch (B) and output targets, allocated together.
pub struct GpuFrameTargets {
    scene: RenderTarget,
    history: RenderTarget,
    scratch: RenderTarget,
    output: RenderTarget,
    width: u32,
    height: u32,
}

impl GpuFrameTargets {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        Self {
            scene: RenderTarget::linear(device, "scene_target", width, height),
            history: RenderTarget::linear(device, "history_target", width, height),
            scratch: RenderTarget::linear(device, "scratch_target", width, height),
            output: RenderTarget::for_output(device, "output_target", width, height),
            width,
            height,
        }
    }

    pub fn scene(&self) -> &RenderTarget {
        &self.scene
    }

    pub fn output(&self) -> &RenderTarget {
        &self.output
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// One tick's worth of compositor commands, recorded into `encoder`.
pub struct GpuCompositePass<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub encoder: &'a mut CommandEncoder,
    pub pipeline: &'a CompositePipeline,
    pub targets: &'a GpuFrameTargets,
}

impl GpuCompositePass<'_> {
    fn copy(&mut self, from: &RenderTarget, to: &RenderTarget) {
        self.encoder.copy_texture_to_texture(
            from.texture().as_image_copy(),
            to.texture().as_image_copy(),
            self.targets.extent(),
        );
    }

    fn fullscreen(
        &mut self,
        label: &'static str,
        pipeline: &RenderPipeline,
        bind_group: &BindGroup,
        target: &TextureView,
    ) {
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

impl CompositeTarget for GpuCompositePass<'_> {
    fn seed_history(&mut self) {
        let targets = self.targets;
        self.copy(&targets.scene, &targets.history);
    }

    fn blend(&mut self, ratio: f32) {
        let params = CompositeParams {
            mix_ratio: ratio,
            _padding: [0.0; 3],
        };
        self.queue
            .write_buffer(&self.pipeline.params, 0, bytemuck::bytes_of(&params));

        let (pipeline, targets) = (self.pipeline, self.targets);
        let bind_group = pipeline.bind_group(self.device, targets.scene.view(), targets.history.view());
        self.fullscreen(
            "blend_pass",
            &pipeline.blend_pipeline,
            &bind_group,
            targets.scratch.view(),
        );
    }

    fn save(&mut self) {
        let targets = self.targets;
        self.copy(&targets.scratch, &targets.history);
    }

    fn present(&mut self) {
        let (pipeline, targets) = (self.pipeline, self.targets);
        let bind_group =
            pipeline.bind_group(self.device, targets.scratch.view(), targets.scratch.view());
        self.fullscreen(
            "output_pass",
            &pipeline.copy_pipeline,
            &bind_group,
            targets.output.view(),
        );
    }
}

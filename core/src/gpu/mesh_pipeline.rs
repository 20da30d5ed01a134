//! Icosphere rendering pipeline.

use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline};

use super::layouts::create_mesh_layout;
use super::pipelines::{create_pipeline_layout, RenderPipelineBuilder};
use super::textures::{DEPTH_FORMAT, LINEAR_FORMAT};
use crate::mesh::{Geometry, Vertex};

/// Uniform block of `mesh.wgsl`. The two scalars are the material's
/// `uTime` and `uAudioFrequency` slots.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub time: f32,
    pub audio_frequency: f32,
    pub _padding: [f32; 2],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Pipeline plus the geometry and uniform buffers it draws with.
pub struct MeshPipeline {
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
    pub uniform_buffer: Buffer,
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

impl MeshPipeline {
    /// Upload `geometry` and build the depth-tested pipeline that draws it
    /// into a linear target.
    pub fn new(device: &Device, geometry: &Geometry) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let bind_group_layout = create_mesh_layout(device);
        let pipeline_layout =
            create_pipeline_layout(device, "mesh_pipeline_layout", &[&bind_group_layout]);

        let pipeline = RenderPipelineBuilder::new("mesh_pipeline", &shader)
            .layout(&pipeline_layout)
            .vertex_buffers(vec![vertex_layout()])
            .format(LINEAR_FORMAT)
            .depth(DEPTH_FORMAT)
            .build(device);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_uniforms"),
            size: std::mem::size_of::<MeshUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "Uploaded icosphere: {} vertices, {} triangles",
            geometry.vertices.len(),
            geometry.triangle_count()
        );

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    pub fn create_bind_group(&self, device: &Device) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: self.uniform_buffer.as_entire_binding(),
            }],
        })
    }
}

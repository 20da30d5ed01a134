//! GPU renderer tests. Each test returns early when no adapter is available.

use sonomesh::gpu::{
    CompositePipeline, GpuCompositePass, GpuContext, GpuFrameTargets, MeshRenderer,
    ReadbackBuffer, RenderConfig,
};
use sonomesh::mesh::MeshConfig;
use sonomesh::{
    AnalyserSettings, AudioSource, FrameCompositor, MeshTransform, PlaybackSettings, RenderError,
    RenderLoop, SceneRenderer, ShaderMaterial, UniformBinder, UniformNames, DEFAULT_BLEND_RATIO,
};

const SIZE: u32 = 96;

fn config() -> RenderConfig {
    RenderConfig {
        width: SIZE,
        height: SIZE,
        mesh: MeshConfig {
            radius: 2.0,
            detail: 12,
        },
        ..Default::default()
    }
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

async fn context() -> Option<GpuContext> {
    match GpuContext::new().await {
        Ok(ctx) => Some(ctx),
        Err(_) => {
            eprintln!("Skipping test - GPU not available");
            None
        }
    }
}

#[tokio::test]
async fn test_sphere_in_centre_background_in_corners() {
    let Some(ctx) = context().await else {
        return;
    };

    let audio = AudioSource::new(AnalyserSettings::default(), PlaybackSettings::default()).unwrap();
    let mut material = ShaderMaterial::new();
    let binder = UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();
    let renderer = MeshRenderer::with_context(ctx, config(), &material).unwrap();
    let mut render_loop = RenderLoop::new(audio, material, binder, renderer);

    for i in 0..3 {
        render_loop.tick(i as f64 / 60.0, 1.0 / 60.0).unwrap();
    }

    let pixels = render_loop.renderer().read_frame().unwrap();
    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);

    let centre = pixel(&pixels, SIZE / 2, SIZE / 2);
    assert!(centre[..3].iter().any(|&c| c > 0), "centre is {:?}", centre);
    assert_eq!(pixel(&pixels, 0, 0), [0, 0, 0, 255]);
    assert_eq!(pixel(&pixels, SIZE - 1, SIZE - 1), [0, 0, 0, 255]);
    assert_eq!(render_loop.renderer().compositor().frames(), 3);
}

#[tokio::test]
async fn test_background_colour_reaches_output() {
    let Some(ctx) = context().await else {
        return;
    };

    let mut material = ShaderMaterial::new();
    UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();
    let mut renderer = MeshRenderer::with_context(
        ctx,
        RenderConfig {
            background: [1.0, 0.0, 0.0],
            ..config()
        },
        &material,
    )
    .unwrap();

    renderer
        .draw(&material, &MeshTransform::default())
        .unwrap();
    let pixels = renderer.read_frame().unwrap();
    assert_eq!(pixel(&pixels, 0, 0), [255, 0, 0, 255]);
}

#[tokio::test]
async fn test_renamed_uniforms_must_exist_on_material() {
    let Some(ctx) = context().await else {
        return;
    };

    let mut material = ShaderMaterial::new();
    UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();

    let renamed = RenderConfig {
        uniforms: UniformNames {
            time: "uTime".into(),
            audio: "uBass".into(),
        },
        ..config()
    };
    let result = MeshRenderer::with_context(ctx, renamed, &material);
    assert!(matches!(result, Err(RenderError::Uniform(_))));
}

/// Half-float bit patterns for the Rgba16Float scene target.
const HALF_ZERO: u16 = 0x0000;
const HALF_ONE: u16 = 0x3c00;

fn fill_scene(ctx: &GpuContext, targets: &GpuFrameTargets, rgb: u16) {
    let (width, height) = (targets.width(), targets.height());
    let texel = [rgb, rgb, rgb, HALF_ONE];
    let bytes: Vec<u8> = (0..width * height)
        .flat_map(|_| texel)
        .flat_map(u16::to_le_bytes)
        .collect();

    ctx.queue.write_texture(
        targets.scene().texture().as_image_copy(),
        &bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 8),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[tokio::test]
async fn test_gpu_history_decays_geometrically() {
    let Some(ctx) = context().await else {
        return;
    };

    let (width, height) = (8, 8);
    let pipeline = CompositePipeline::new(&ctx.device);
    let targets = GpuFrameTargets::new(&ctx.device, width, height);
    let readback = ReadbackBuffer::new(&ctx.device, width, height);
    let mut compositor = FrameCompositor::new(DEFAULT_BLEND_RATIO).unwrap();

    for tick in 0..6 {
        fill_scene(&ctx, &targets, if tick == 0 { HALF_ONE } else { HALF_ZERO });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut pass = GpuCompositePass {
                device: &ctx.device,
                queue: &ctx.queue,
                encoder: &mut encoder,
                pipeline: &pipeline,
                targets: &targets,
            };
            compositor.composite(&mut pass);
        }
        readback.copy_from(&mut encoder, targets.output().texture());
        ctx.queue.submit(Some(encoder.finish()));

        let pixels = readback.read_pixels(&ctx.device).unwrap();
        let expected = 255.0 * DEFAULT_BLEND_RATIO.powi(tick);
        for &channel in &pixels[..3] {
            assert!(
                (channel as f32 - expected).abs() <= 2.0,
                "tick {}: got {}, expected {:.1}",
                tick,
                channel,
                expected
            );
        }
        assert_eq!(pixels[3], 255);
    }
    assert_eq!(compositor.frames(), 6);
}

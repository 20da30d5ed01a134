//! End-to-end tick behaviour against a CPU scene renderer.

use glam::Vec3;
use sonomesh::audio::{generate_silence, generate_sine, mono_track};
use sonomesh::compositor::{CpuFrameTargets, FrameCompositor, DEFAULT_BLEND_RATIO};
use sonomesh::{
    AnalyserSettings, AudioSource, MeshTransform, PlaybackSettings, RenderError, RenderLoop,
    RotationMode, SceneRenderer, ShaderMaterial, UniformBinder, UniformNames,
};

/// Paints the audio uniform into C and runs the compositor, like the GPU
/// renderer does with the real scene.
struct CpuScene {
    targets: CpuFrameTargets,
    compositor: FrameCompositor,
    seen_audio: Vec<f32>,
    seen_rotation: Vec<Vec3>,
}

impl CpuScene {
    fn new() -> Self {
        Self {
            targets: CpuFrameTargets::new(4, 4),
            compositor: FrameCompositor::new(DEFAULT_BLEND_RATIO).unwrap(),
            seen_audio: Vec::new(),
            seen_rotation: Vec::new(),
        }
    }
}

impl SceneRenderer for CpuScene {
    fn draw(
        &mut self,
        material: &ShaderMaterial,
        transform: &MeshTransform,
    ) -> Result<(), RenderError> {
        let audio = material.get("uAudioFrequency").unwrap_or_default();
        self.seen_audio.push(audio);
        self.seen_rotation.push(transform.rotation);

        self.targets.current_mut().fill([audio, 0.0, 0.0, 1.0]);
        self.compositor.composite(&mut self.targets);
        Ok(())
    }
}

fn render_loop() -> RenderLoop<CpuScene> {
    let audio = AudioSource::new(AnalyserSettings::default(), PlaybackSettings::default()).unwrap();
    let mut material = ShaderMaterial::new();
    let binder = UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();
    RenderLoop::new(audio, material, binder, CpuScene::new())
}

#[test]
fn test_rotation_counts_ticks_not_time() {
    let mut render_loop = render_loop();
    let initial = render_loop.transform().rotation;
    assert_eq!(initial, Vec3::new(0.0, 0.0, 1.0));

    // Irregular frame pacing
    let deltas = [0.016, 0.1, 0.001, 0.5, 0.033, 0.016, 2.0, 0.008];
    let mut now = 0.0;
    for &delta in deltas.iter().cycle().take(40) {
        now += delta;
        render_loop.tick(now, delta).unwrap();
    }

    let expected = initial + Vec3::splat(40.0 * 0.05);
    assert!(render_loop
        .transform()
        .rotation
        .abs_diff_eq(expected, 1e-4));
}

#[test]
fn test_audio_uniform_is_amplitude_over_fifty() {
    let mut render_loop = render_loop();
    let track = mono_track(generate_sine(2000.0, 16000, 2.0, 0.7), 16000).unwrap();
    render_loop.audio_mut().load_track(track);

    for i in 0..30 {
        let report = render_loop.tick(i as f64 / 60.0, 1.0 / 60.0).unwrap();
        assert_eq!(report.audio_uniform, report.amplitude / 50.0);
        assert_eq!(
            render_loop.material().get("uAudioFrequency"),
            Some(report.amplitude / 50.0)
        );
    }
    assert!(render_loop.audio().last_amplitude() > 0.0);
}

#[test]
fn test_silent_track_keeps_uniform_at_zero() {
    let mut render_loop = render_loop();
    let track = mono_track(generate_silence(8000, 1.0), 8000).unwrap();
    render_loop.audio_mut().load_track(track);

    for i in 0..90 {
        let report = render_loop.tick(i as f64 / 60.0, 1.0 / 60.0).unwrap();
        assert_eq!(report.amplitude, 0.0);
        assert_eq!(report.audio_uniform, 0.0);
    }
    assert!(render_loop.renderer().seen_audio.iter().all(|&a| a == 0.0));
    assert_eq!(
        render_loop.renderer().targets.output().pixel(0, 0),
        [0.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn test_binding_is_idempotent_and_set_is_local() {
    let mut material = ShaderMaterial::new();
    let binder = UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();
    let again = UniformBinder::attach(&mut material, &UniformNames::default(), 50.0).unwrap();
    assert_eq!(binder.audio_handle(), again.audio_handle());
    assert_eq!(material.len(), 2);

    material.bind("uExtra", 7.0);
    assert!(material.set("uTime", 3.5));
    assert_eq!(material.get("uTime"), Some(3.5));
    assert_eq!(material.get("uAudioFrequency"), Some(0.0));
    assert_eq!(material.get("uExtra"), Some(7.0));
}

#[test]
fn test_renderer_sees_values_of_the_same_tick() {
    let mut render_loop = render_loop().with_rotation_mode(RotationMode::PerTick { step: 0.1 });
    let track = mono_track(generate_sine(1000.0, 8000, 1.0, 0.9), 8000).unwrap();
    render_loop.audio_mut().load_track(track);

    let first = render_loop.tick(5.0, 0.05).unwrap();
    let second = render_loop.tick(5.05, 0.05).unwrap();

    let scene = render_loop.renderer();
    assert_eq!(scene.seen_audio, vec![first.audio_uniform, second.audio_uniform]);
    assert_eq!(scene.seen_rotation, vec![first.rotation, second.rotation]);
    assert!((second.elapsed_seconds - 0.05).abs() < 1e-6);
}

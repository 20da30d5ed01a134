//! Example: Run a headless session and save the last presented frame.
//!
//! Loads a JSON config (or the reference defaults), ticks the render loop at
//! a fixed 60 Hz clock and writes the output to a PNG. Without an audio path
//! in the config a synthetic tone is played instead.
//!
//! Run with:
//!     cargo run --example headless_session -- [config.json] [out.png]

use std::path::PathBuf;

use anyhow::Context;
use sonomesh::audio::synth::{generate_sine, mono_track};
use sonomesh::compositor::save_rgba8_png;
use sonomesh::{build_render_loop_blocking, VisualizerConfig};

const TICKS: u32 = 120;
const TICK_SECONDS: f64 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => VisualizerConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => VisualizerConfig::default(),
    };
    let output = PathBuf::from(args.next().unwrap_or_else(|| "sonomesh_frame.png".into()));

    // Keep the demo quick on integrated GPUs
    if config.mesh.detail > 64 {
        log::info!("Reducing icosphere detail {} -> 64", config.mesh.detail);
        config.mesh.detail = 64;
    }

    let mut render_loop = build_render_loop_blocking(&config)?;
    log::info!("GPU: {}", render_loop.renderer().adapter_info().name);

    if config.audio.path.is_none() {
        let tone = mono_track(generate_sine(220.0, 44100, 4.0, 0.8), 44100)?;
        render_loop.audio_mut().load_track(tone);
    }

    let mut last = None;
    for i in 0..TICKS {
        let report = render_loop.tick(i as f64 * TICK_SECONDS, TICK_SECONDS)?;
        if i % 30 == 0 {
            log::info!(
                "tick {:>3}: amplitude {:6.2}, uAudioFrequency {:.3}",
                report.tick,
                report.amplitude,
                report.audio_uniform
            );
        }
        last = Some(report);
    }

    if let Some(report) = last {
        log::info!(
            "final rotation: ({:.2}, {:.2}, {:.2})",
            report.rotation.x,
            report.rotation.y,
            report.rotation.z
        );
    }

    let pixels = render_loop.renderer().read_frame()?;
    save_rgba8_png(&output, config.width, config.height, pixels)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());

    Ok(())
}

//! Integration tests for decoding, playback and loudness.

use std::path::Path;
use std::time::Duration;

use sonomesh::audio::{
    generate_sine, generate_white_noise, load_track, AnalyserSettings, AudioSource, LoadState,
    PlaybackSettings,
};

const SAMPLE_RATE: u32 = 44100;

fn write_wav(path: &Path, channels: u16, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

fn source() -> AudioSource {
    AudioSource::new(AnalyserSettings::default(), PlaybackSettings::default()).unwrap()
}

#[test]
fn test_decode_stereo_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");

    let left = generate_sine(440.0, SAMPLE_RATE, 0.5, 0.5);
    let interleaved: Vec<f32> = left.iter().flat_map(|&s| [s, -s]).collect();
    write_wav(&path, 2, &interleaved);

    let track = load_track(&path).unwrap();
    assert_eq!(track.sample_rate(), SAMPLE_RATE);
    assert_eq!(track.channels(), 2);
    assert_eq!(track.num_frames(), left.len());
    assert!((track.duration() - 0.5).abs() < 1e-3);
    // Opposite channels cancel in the downmix
    assert!(track.mono().iter().all(|s| s.abs() < 1e-3));
}

#[test]
fn test_silent_asset_gives_zero_amplitude_every_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, 1, &vec![0.0; SAMPLE_RATE as usize]);

    let mut source = source();
    assert!(source.load_blocking(&path).is_ready());

    for _ in 0..120 {
        source.advance(1.0 / 60.0);
        assert_eq!(source.amplitude(), 0.0);
    }
}

#[test]
fn test_noise_asset_is_loud() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.wav");
    write_wav(&path, 1, &generate_white_noise(SAMPLE_RATE, 1.0, 0.8, 7));

    let mut source = source();
    source.load_blocking(&path);
    source.advance(0.25);
    let amplitude = source.amplitude();
    assert!(amplitude > 0.0 && amplitude <= 255.0);
}

#[test]
fn test_background_load_becomes_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 1, &generate_sine(1000.0, SAMPLE_RATE, 1.0, 0.8));

    let mut source = source();
    source.load(&path);

    let mut attempts = 0;
    while source.poll().is_pending() && attempts < 1000 {
        std::thread::sleep(Duration::from_millis(5));
        attempts += 1;
    }

    assert!(matches!(source.load_state(), LoadState::Ready));
    let state = source.playback_state().unwrap();
    assert!(state.is_looping && state.is_playing);
    assert_eq!(state.volume, 0.5);
}

#[test]
fn test_playback_loops_past_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.wav");
    write_wav(&path, 1, &generate_sine(1000.0, SAMPLE_RATE, 0.1, 0.8));

    let mut source = source();
    source.load_blocking(&path);

    // Ten times the track length
    for _ in 0..60 {
        source.advance(1.0 / 60.0);
    }
    assert!(source.playback_state().unwrap().is_playing);
    assert!(source.amplitude() > 0.0);
}

#[test]
fn test_garbage_file_fails_without_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.mp3");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let mut source = source();
    let state = source.load_blocking(&path);
    assert!(state.error().is_some());
    assert_eq!(source.amplitude(), 0.0);
}

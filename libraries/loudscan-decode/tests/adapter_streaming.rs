//! Streaming behavior of the built-in adapters against real WAV fixtures
//!
//! Fixtures are synthesized with hound into a temp directory. The symphonia
//! family is exercised directly on the same WAV data (its probe recognizes
//! the container regardless of which family the registry would pick), which
//! keeps the test hermetic without shipping compressed fixtures.

use loudscan_decode::{DecoderAdapter, DecoderFamily, DecoderRegistry, SymphoniaFamily};
use loudscan_engine::{LoudnessState, Measures};
use std::path::{Path, PathBuf};

const SAMPLE_RATE: u32 = 44100;

/// Write a stereo 16-bit sine fixture and return its path.
fn write_sine_wav(dir: &Path, name: &str, frames: u32, amplitude: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = amplitude * (2.0 * std::f32::consts::PI * 997.0 * t).sin();
        let quantized = (sample * 32767.0) as i16;
        writer.write_sample(quantized).unwrap();
        writer.write_sample(quantized).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn drain(adapter: &mut dyn DecoderAdapter) -> (u64, f32) {
    adapter.allocate_buffer().unwrap();
    let channels = adapter.channels() as usize;
    let mut frames_total = 0_u64;
    let mut peak = 0.0_f32;
    loop {
        let frames = adapter.read_frames().unwrap();
        if frames == 0 {
            break;
        }
        for sample in &adapter.buffer()[..frames * channels] {
            peak = peak.max(sample.abs());
        }
        frames_total += frames as u64;
        if frames < adapter.sample_rate() as usize {
            break;
        }
    }
    (frames_total, peak)
}

#[test]
fn wav_adapter_streams_every_declared_frame() {
    let dir = tempfile::tempdir().unwrap();
    // 2.5 seconds: two full reads plus a short final read.
    let frames = SAMPLE_RATE * 5 / 2;
    let path = write_sine_wav(dir.path(), "tone.wav", frames, 0.5);

    let registry = DecoderRegistry::new().unwrap();
    let mut adapter = registry.resolve(&path).unwrap();

    assert_eq!(adapter.channels(), 2);
    assert_eq!(adapter.sample_rate(), SAMPLE_RATE);
    assert_eq!(adapter.total_frames(), u64::from(frames));

    let (streamed, peak) = drain(adapter.as_mut());
    assert_eq!(streamed, u64::from(frames));
    assert!(
        (peak - 0.5).abs() < 0.01,
        "expected peak near 0.5, got {peak:.4}"
    );

    adapter.close().unwrap();
    assert!(adapter.close().is_err());
}

#[test]
fn wav_adapter_reports_no_channel_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine_wav(dir.path(), "tone.wav", SAMPLE_RATE, 0.3);

    let registry = DecoderRegistry::new().unwrap();
    let adapter = registry.resolve(&path).unwrap();

    let mut state = LoudnessState::new(2, SAMPLE_RATE, Measures::default()).unwrap();
    assert!(matches!(
        adapter.map_channels(&mut state),
        Err(loudscan_decode::DecodeError::NoChannelMap)
    ));
}

#[test]
fn wav_adapter_handles_zero_length_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine_wav(dir.path(), "empty.wav", 0, 0.0);

    let registry = DecoderRegistry::new().unwrap();
    let mut adapter = registry.resolve(&path).unwrap();
    assert_eq!(adapter.total_frames(), 0);

    adapter.allocate_buffer().unwrap();
    assert_eq!(adapter.read_frames().unwrap(), 0);
}

#[test]
fn symphonia_adapter_streams_the_same_audio() {
    let dir = tempfile::tempdir().unwrap();
    let frames = SAMPLE_RATE * 2;
    let path = write_sine_wav(dir.path(), "tone.wav", frames, 0.4);

    let mut adapter = SymphoniaFamily.open(&path).unwrap();
    assert_eq!(adapter.channels(), 2);
    assert_eq!(adapter.sample_rate(), SAMPLE_RATE);
    assert_eq!(adapter.total_frames(), u64::from(frames));

    let (streamed, peak) = drain(adapter.as_mut());
    assert_eq!(streamed, u64::from(frames));
    assert!(
        (peak - 0.4).abs() < 0.01,
        "expected peak near 0.4, got {peak:.4}"
    );
}

#[test]
fn symphonia_adapter_maps_stereo_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine_wav(dir.path(), "tone.wav", SAMPLE_RATE, 0.4);

    let adapter = SymphoniaFamily.open(&path).unwrap();
    let mut state = LoudnessState::new(2, SAMPLE_RATE, Measures::default()).unwrap();
    adapter.map_channels(&mut state).unwrap();
}

#[test]
fn both_adapters_measure_the_same_loudness() {
    let dir = tempfile::tempdir().unwrap();
    let frames = SAMPLE_RATE * 3;
    let path = write_sine_wav(dir.path(), "tone.wav", frames, 0.2);

    let registry = DecoderRegistry::new().unwrap();
    let mut loudness = Vec::new();
    for mut adapter in [registry.resolve(&path).unwrap(), SymphoniaFamily.open(&path).unwrap()] {
        adapter.allocate_buffer().unwrap();
        let channels = adapter.channels();
        let mut state = LoudnessState::new(channels, SAMPLE_RATE, Measures::default()).unwrap();
        loop {
            let frames = adapter.read_frames().unwrap();
            if frames == 0 {
                break;
            }
            state
                .add_frames(&adapter.buffer()[..frames * channels as usize])
                .unwrap();
            if frames < SAMPLE_RATE as usize {
                break;
            }
        }
        loudness.push(state.integrated_loudness().unwrap());
    }

    assert!(
        (loudness[0] - loudness[1]).abs() < 0.01,
        "hound {:.3} vs symphonia {:.3}",
        loudness[0],
        loudness[1]
    );
}

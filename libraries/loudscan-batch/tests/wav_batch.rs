//! End-to-end batch scans over real WAV fixtures

use loudscan_batch::{album_gain, track_gain, BatchScanner, PeakMode, ScanOptions};
use std::path::{Path, PathBuf};

const SAMPLE_RATE: u32 = 44100;

fn write_sine_wav(dir: &Path, name: &str, seconds: f32, amplitude: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (SAMPLE_RATE as f32 * seconds) as u32;
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

#[test]
fn two_file_batch_reaches_the_expected_cumulative_progress() {
    let dir = tempfile::tempdir().unwrap();
    // 10s declares 441000 frames, 5s declares 220500.
    let a = write_sine_wav(dir.path(), "a.wav", 10.0, 0.25);
    let b = write_sine_wav(dir.path(), "b.wav", 5.0, 0.25);

    let scanner = BatchScanner::new(ScanOptions::default()).unwrap().workers(2);
    let report = scanner.scan(&[a, b]).unwrap();

    assert_eq!(report.frames_declared, 661500);
    assert_eq!(report.frames_processed, 661500);
    for record in &report.files {
        assert!(record.scanned);
        assert!(!record.short_read);
        assert_eq!(record.elapsed_frames, record.total_frames);
    }
}

#[test]
fn batch_of_two_identical_files_matches_the_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_sine_wav(dir.path(), "a.wav", 6.0, 0.2);
    let b = write_sine_wav(dir.path(), "b.wav", 6.0, 0.2);

    let options = ScanOptions {
        loudness_range: true,
        peak: PeakMode::All,
    };

    let single = BatchScanner::new(options).unwrap().scan(&[a.clone()]).unwrap();
    let pair = BatchScanner::new(options).unwrap().scan(&[a, b]).unwrap();

    let single_lufs = single.summary.integrated_lufs.unwrap();
    let pair_lufs = pair.summary.integrated_lufs.unwrap();
    assert!(
        (single_lufs - pair_lufs).abs() < 0.05,
        "pair {pair_lufs:.3} != single {single_lufs:.3}"
    );

    // Peaks aggregate as a maximum, so identical files change nothing.
    assert_eq!(single.summary.sample_peak, pair.summary.sample_peak);
}

#[test]
fn measurements_are_plausible_for_a_known_tone() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine_wav(dir.path(), "tone.wav", 5.0, 0.1);

    let report = BatchScanner::new(ScanOptions {
        loudness_range: true,
        peak: PeakMode::All,
    })
    .unwrap()
    .scan(&[path])
    .unwrap();

    let measurement = report.files[0].measurement.unwrap();

    // A -20 dBFS sine sits around -23 LUFS after K-weighting.
    let lufs = measurement.integrated_lufs.unwrap();
    assert!(lufs > -30.0 && lufs < -15.0, "got {lufs:.2} LUFS");

    let sample_peak_dbfs = measurement.sample_peak_dbfs().unwrap();
    assert!(
        (sample_peak_dbfs - (-20.0)).abs() < 0.5,
        "got {sample_peak_dbfs:.2} dBFS"
    );

    let true_peak = measurement.true_peak.unwrap();
    assert!(true_peak >= measurement.sample_peak.unwrap() - 1e-6);

    // A steady tone has almost no loudness range.
    let lra = measurement.loudness_range_lu.unwrap();
    assert!(lra < 1.0, "got {lra:.2} LU");
}

#[test]
fn gains_follow_the_measured_batch() {
    let dir = tempfile::tempdir().unwrap();
    // Close enough in level that the combined relative gate keeps blocks
    // from both programs.
    let quiet = write_sine_wav(dir.path(), "quiet.wav", 4.0, 0.1);
    let loud = write_sine_wav(dir.path(), "loud.wav", 4.0, 0.25);

    let report = BatchScanner::new(ScanOptions {
        loudness_range: false,
        peak: PeakMode::True,
    })
    .unwrap()
    .scan(&[quiet, loud])
    .unwrap();

    let quiet_gain = track_gain(&report.files[0].measurement.unwrap()).unwrap();
    let loud_gain = track_gain(&report.files[1].measurement.unwrap()).unwrap();
    assert!(quiet_gain.gain_db > loud_gain.gain_db);

    let album = album_gain(&report.summary).unwrap();
    assert!(album.gain_db < quiet_gain.gain_db);
    assert!(album.gain_db > loud_gain.gain_db);
    assert_eq!(album.peak, report.summary.true_peak);
}

#[test]
fn mixed_batch_reports_failures_alongside_measurements() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_sine_wav(dir.path(), "good.wav", 4.0, 0.2);
    let missing = dir.path().join("missing.wav");
    let unknown = dir.path().join("cover.png");
    std::fs::write(&unknown, b"not audio").unwrap();

    let report = BatchScanner::new(ScanOptions::default())
        .unwrap()
        .scan(&[good, missing.clone(), unknown.clone()])
        .unwrap();

    assert!(report.files[0].scanned);
    assert!(report.files[1].error.is_some());
    assert!(report.files[2].error.is_some());
    assert_eq!(report.summary.files_scanned, 1);
    assert_eq!(report.summary.failures.len(), 2);
    assert_eq!(report.summary.failures[0].0, missing);
    assert_eq!(report.summary.failures[1].0, unknown);
}

use std::path::{Path, PathBuf};
use std::time::Instant;

use egui::Color32;
use loopscope::audio::{self, SymphoniaDecoder};
use loopscope::catalog::MemoryCatalog;
use loopscope::envelope;
use loopscope::render::{RenderCache, RenderOutcome, Viewport};
use loopscope::SampleCatalog;

fn write_wav(dir: &Path, name: &str, channels: u16, frames: usize, amplitude: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate: 44_100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..frames * channels as usize {
        writer.write_sample(amplitude).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn decodes_float_wav_and_builds_flat_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "flat.wav", 1, 44_100, 0.5);

    let buffer = audio::load_audio_file(&path).unwrap();
    assert_eq!(buffer.channels, 1);
    assert_eq!(buffer.sample_rate_hz, 44_100);
    assert_eq!(buffer.frame_count, 44_100);
    assert_eq!(buffer.duration_ms(), 1_000);

    let envelope = envelope::build_envelope(&buffer, 100);
    assert_eq!(envelope.len(), 100);
    assert!(envelope.bars.iter().all(|bar| (bar - 1.0).abs() < 1e-4));
}

#[test]
fn stereo_wav_is_interleaved() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "stereo.wav", 2, 22_050, 0.25);
    let buffer = audio::load_audio_file(&path).unwrap();
    assert_eq!(buffer.channels, 2);
    assert_eq!(buffer.frame_count, 22_050);
    assert_eq!(buffer.samples.len(), 44_100);
}

#[test]
fn duration_probe_matches_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "half.wav", 1, 22_050, 0.1);
    assert_eq!(audio::probe_duration_ms(&path).unwrap(), 500);
}

#[test]
fn catalog_registers_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "Kick 01.WAV", 1, 4_410, 0.3);
    let mut catalog = MemoryCatalog::new();
    let name = catalog.add_file(&path).unwrap();
    assert_eq!(name, "Kick 01.WAV");
    assert_eq!(catalog.path_of(&name), Some(path));
    assert_eq!(catalog.extension_of(&name).as_deref(), Some("wav"));
    assert_eq!(catalog.duration_ms_of(&name), Some(100));
}

#[test]
fn undecodable_file_renders_blank_bitmap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let mut cache = RenderCache::new(Box::new(SymphoniaDecoder), Color32::WHITE, Default::default());
    let outcome = cache.ensure_up_to_date(Viewport::new(64, 32), Some(&path), Instant::now());
    assert_eq!(outcome, RenderOutcome::Rebuilt);
    assert!(cache.envelope().is_empty());
    let bitmap = cache.bitmap().unwrap();
    assert!(bitmap.pixels.iter().all(|pixel| *pixel == Color32::TRANSPARENT));
}

#[test]
fn rendered_bitmap_exports_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "tone.wav", 1, 8_000, 0.4);
    let mut cache = RenderCache::new(Box::new(SymphoniaDecoder), Color32::RED, Default::default());
    cache.ensure_up_to_date(Viewport::new(50, 20), Some(&path), Instant::now());

    let out = dir.path().join("tone.png");
    loopscope::render::bitmap_to_png(cache.bitmap().unwrap(), &out).unwrap();
    let png = image::open(&out).unwrap();
    assert_eq!((png.width(), png.height()), (50, 20));
}

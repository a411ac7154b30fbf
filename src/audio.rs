use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use crate::error::DecodeError;

/// Interleaved PCM decoded from one sample file.
#[derive(Clone, Debug, Default)]
pub struct AudioBuffer {
    pub channels: u16,
    pub frame_count: u64,
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>, // Interleaved samples
}

impl AudioBuffer {
    pub fn new(channels: u16, sample_rate_hz: u32, samples: Vec<f32>) -> Self {
        let channels = channels.max(1);
        let frame_count = (samples.len() / channels as usize) as u64;
        Self {
            channels,
            frame_count,
            sample_rate_hz,
            samples,
        }
    }

    /// Mono mix of one frame: stereo is averaged, mono is passed through.
    pub fn mono_frame(&self, frame: usize) -> f32 {
        let channels = self.channels.max(1) as usize;
        let start = frame * channels;
        match self.samples.get(start..start + channels) {
            Some([single]) => *single,
            Some([left, right]) => (left + right) / 2.0,
            Some(values) => values.iter().sum::<f32>() / channels as f32,
            None => 0.0,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.frame_count * 1000 / self.sample_rate_hz as u64
    }
}

/// Source of decoded audio for the waveform. The render cache only sees this trait.
pub trait SampleDecoder {
    fn decode(&self, path: &Path) -> Result<AudioBuffer, DecodeError>;
}

/// Decodes through symphonia's default codec registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl SampleDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<AudioBuffer, DecodeError> {
        load_audio_file(path)
    }
}

fn probe(source: Box<dyn MediaSource>, hint: &Hint) -> Result<Box<dyn FormatReader>, DecodeError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(hint, mss, &fmt_opts, &meta_opts)
        .map_err(DecodeError::Unsupported)?;
    Ok(probed.format)
}

// Core loading function that takes a generic MediaSource
pub fn load_audio_from_source(source: Box<dyn MediaSource>, hint: &Hint) -> Result<AudioBuffer, DecodeError> {
    let mut format = probe(source, hint)?;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(DecodeError::Codec)?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);
    let mut scratch: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream, or a chained stream we do not follow.
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_rate == 0 || channels == 0 {
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;
                }
                let needed = decoded.capacity();
                if scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                    scratch = Some(SampleBuffer::new(needed as u64, spec));
                }
                if let Some(buf) = scratch.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(Error::DecodeError(err)) => debug!("skipping corrupt packet: {err}"),
            Err(_) => break,
        }
    }

    Ok(AudioBuffer::new(channels, sample_rate, samples))
}

fn hint_for(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }
    hint
}

fn open(path: &Path) -> Result<File, DecodeError> {
    File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_audio_file<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, DecodeError> {
    let path = path.as_ref();
    let src = open(path)?;
    load_audio_from_source(Box::new(src), &hint_for(path))
}

pub fn load_audio_from_bytes(data: Vec<u8>, extension_hint: Option<&str>) -> Result<AudioBuffer, DecodeError> {
    let src = Cursor::new(data);

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    load_audio_from_source(Box::new(src), &hint)
}

/// Duration from container metadata, falling back to a full decode when the
/// container does not declare a frame count.
pub fn probe_duration_ms<P: AsRef<Path>>(path: P) -> Result<u64, DecodeError> {
    let path = path.as_ref();
    let format = probe(Box::new(open(path)?), &hint_for(path))?;
    let declared = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .and_then(|t| Some((t.codec_params.n_frames?, t.codec_params.sample_rate?)));

    match declared {
        Some((frames, rate)) if rate > 0 => Ok(frames * 1000 / rate as u64),
        _ => Ok(load_audio_file(path)?.duration_ms()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_are_averaged() {
        let buffer = AudioBuffer::new(2, 44_100, vec![0.2, 0.4, -1.0, 1.0]);
        assert_eq!(buffer.frame_count, 2);
        assert!((buffer.mono_frame(0) - 0.3).abs() < 1e-6);
        assert_eq!(buffer.mono_frame(1), 0.0);
    }

    #[test]
    fn mono_frames_pass_through() {
        let buffer = AudioBuffer::new(1, 8_000, vec![0.25, -0.5]);
        assert_eq!(buffer.mono_frame(1), -0.5);
        assert_eq!(buffer.mono_frame(5), 0.0);
    }

    #[test]
    fn duration_uses_sample_rate() {
        let buffer = AudioBuffer::new(1, 1_000, vec![0.0; 2_500]);
        assert_eq!(buffer.duration_ms(), 2_500);
        assert_eq!(AudioBuffer::default().duration_ms(), 0);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = load_audio_file("/definitely/not/here.wav").unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = load_audio_from_bytes(vec![0u8; 64], Some("wav")).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }
}

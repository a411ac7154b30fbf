use std::path::Path;

use log::{debug, warn};

use crate::audio::{AudioBuffer, SampleDecoder};

/// Starting normalisation factor; keeps silent buffers finite.
pub const NORMALIZATION_EPSILON: f32 = 1e-5;
/// Chunks at or above this RMS never set the normalisation scale.
pub const OUTLIER_CEILING: f32 = 200.0;

/// Per-pixel amplitude values plus the factor they were divided by.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub bars: Vec<f32>,
    pub normalization_factor: f32,
}

impl Envelope {
    /// The envelope of an undecodable file: no bars at all.
    pub fn empty() -> Self {
        Self {
            bars: Vec::new(),
            normalization_factor: NORMALIZATION_EPSILON,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Build an envelope of exactly `width` bars from `buffer`.
pub fn build_envelope(buffer: &AudioBuffer, width: usize) -> Envelope {
    if width == 0 {
        return Envelope::empty();
    }

    let frame_count = buffer.frame_count as usize;
    let chunk_size = frame_count as f64 / width as f64;
    let mut normalization_factor = NORMALIZATION_EPSILON;
    let mut bars = Vec::with_capacity(width);

    for i in 0..width {
        let (start, end) = chunk_bounds(i, chunk_size, frame_count);
        let rms = chunk_rms(buffer, start, end);
        if rms < OUTLIER_CEILING && rms > normalization_factor {
            normalization_factor = rms;
        }
        // Outliers are kept unclamped; see DESIGN.md.
        bars.push(rms);
    }

    for bar in &mut bars {
        *bar /= normalization_factor;
    }

    debug!(
        "built envelope: {} bars from {} frames (chunk {:.2}, factor {:.5})",
        width, frame_count, chunk_size, normalization_factor
    );

    Envelope {
        bars,
        normalization_factor,
    }
}

/// Decode `path` and build its envelope; undecodable files yield [`Envelope::empty`].
pub fn build_from_file(decoder: &dyn SampleDecoder, path: &Path, width: usize) -> Envelope {
    match decoder.decode(path) {
        Ok(buffer) => build_envelope(&buffer, width),
        Err(err) => {
            warn!("waveform unavailable for {}: {err}", path.display());
            Envelope::empty()
        }
    }
}

fn chunk_bounds(index: usize, chunk_size: f64, frame_count: usize) -> (usize, usize) {
    if frame_count == 0 {
        return (0, 0);
    }
    let start = ((index as f64 * chunk_size).floor() as usize).min(frame_count - 1);
    let end = (((index + 1) as f64 * chunk_size).floor() as usize)
        .max(start + 1)
        .min(frame_count);
    (start, end)
}

fn chunk_rms(buffer: &AudioBuffer, start: usize, end: usize) -> f32 {
    if end <= start {
        return 0.0;
    }
    let sum_squares: f64 = (start..end)
        .map(|frame| {
            let sample = buffer.mono_frame(frame) as f64;
            sample * sample
        })
        .sum();
    (sum_squares / (end - start) as f64).sqrt() as f32
}

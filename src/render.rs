use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use egui::{Color32, ColorImage};
use log::debug;

use crate::audio::SampleDecoder;
use crate::envelope::{self, Envelope};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// What `ensure_up_to_date` did this pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Stored bitmap still matches; nothing was decoded.
    Fresh,
    /// Envelope rebuilt and bitmap redrawn.
    Rebuilt,
    /// Viewport resized recently; the old bitmap is kept until the size settles.
    Pending,
    /// No sample or no area to draw into.
    Blank,
}

pub struct RenderCache {
    decoder: Box<dyn SampleDecoder>,
    colour: Color32,
    resize_debounce: Duration,
    dirty: bool,
    envelope: Envelope,
    bitmap: Option<ColorImage>,
    rendered_for: Option<PathBuf>,
    pending_resize: Option<(Viewport, Instant)>,
    rebuilds: usize,
}

impl RenderCache {
    pub fn new(decoder: Box<dyn SampleDecoder>, colour: Color32, resize_debounce: Duration) -> Self {
        Self {
            decoder,
            colour,
            resize_debounce,
            dirty: true,
            envelope: Envelope::empty(),
            bitmap: None,
            rendered_for: None,
            pending_resize: None,
            rebuilds: 0,
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_colour(&mut self, colour: Color32) {
        if self.colour != colour {
            self.colour = colour;
            self.invalidate();
        }
    }

    pub fn colour(&self) -> Color32 {
        self.colour
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn bitmap(&self) -> Option<&ColorImage> {
        self.bitmap.as_ref()
    }

    /// Number of envelope rebuilds since construction.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn ensure_up_to_date(&mut self, viewport: Viewport, sample: Option<&Path>, now: Instant) -> RenderOutcome {
        let Some(path) = sample else {
            self.clear();
            return RenderOutcome::Blank;
        };
        if viewport.is_degenerate() {
            self.clear();
            return RenderOutcome::Blank;
        }

        let size_matches = self.bitmap.as_ref().is_some_and(|image| image.size == viewport.size());
        let sample_matches = self.rendered_for.as_deref() == Some(path);
        if !self.dirty && size_matches && sample_matches {
            self.pending_resize = None;
            return RenderOutcome::Fresh;
        }

        if !self.dirty && sample_matches && self.bitmap.is_some() && !self.resize_settled(viewport, now) {
            return RenderOutcome::Pending;
        }

        self.rebuild(viewport, path);
        RenderOutcome::Rebuilt
    }

    fn resize_settled(&mut self, viewport: Viewport, now: Instant) -> bool {
        match self.pending_resize {
            Some((pending, since)) if pending == viewport => now.duration_since(since) >= self.resize_debounce,
            _ => {
                self.pending_resize = Some((viewport, now));
                self.resize_debounce.is_zero()
            }
        }
    }

    fn rebuild(&mut self, viewport: Viewport, path: &Path) {
        self.envelope = envelope::build_from_file(self.decoder.as_ref(), path, viewport.width as usize);
        self.bitmap = Some(paint_bars(&self.envelope, viewport, self.colour));
        self.rendered_for = Some(path.to_path_buf());
        self.pending_resize = None;
        self.dirty = false;
        self.rebuilds += 1;
        debug!(
            "waveform bitmap rebuilt for {} at {}x{}",
            path.display(),
            viewport.width,
            viewport.height
        );
    }

    fn clear(&mut self) {
        self.envelope = Envelope::empty();
        self.bitmap = None;
        self.rendered_for = None;
        self.pending_resize = None;
    }
}

/// Draw one centred vertical line per bar into a transparent bitmap.
pub fn paint_bars(envelope: &Envelope, viewport: Viewport, colour: Color32) -> ColorImage {
    let mut image = ColorImage::new(viewport.size(), Color32::TRANSPARENT);
    if envelope.is_empty() || viewport.is_degenerate() {
        return image;
    }

    let width = viewport.width as usize;
    let height = viewport.height as f32;
    let centre = height / 2.0;
    let len = envelope.len() as f32;

    for (i, bar) in envelope.bars.iter().enumerate() {
        let x = (viewport.width as f32 * (i as f32 / len)) as usize;
        if x >= width {
            continue;
        }
        let extent = bar.max(0.0) * centre;
        let top = (centre - extent).floor().max(0.0) as usize;
        let bottom = ((centre + extent).ceil() as usize).min(viewport.height as usize);
        for y in top..bottom {
            image.pixels[y * width + x] = colour;
        }
    }
    image
}

/// Write a rendered bitmap to disk as PNG.
pub fn bitmap_to_png(bitmap: &ColorImage, path: &Path) -> image::ImageResult<()> {
    let [width, height] = bitmap.size;
    let mut out = image::RgbaImage::new(width as u32, height as u32);
    for (pixel, colour) in out.pixels_mut().zip(&bitmap.pixels) {
        *pixel = image::Rgba(colour.to_srgba_unmultiplied());
    }
    out.save(path)
}

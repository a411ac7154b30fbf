use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use rodio::{OutputStream, Sink, Source};

use crate::audio::{self, AudioBuffer};
use crate::collaborators::Player;
use crate::error::PlayerError;

const NO_LOOP: usize = usize::MAX;

/// Playback state shared between the UI thread and the audio thread.
#[derive(Debug)]
pub struct Transport {
    frame: AtomicUsize,
    loop_start: AtomicUsize,
    loop_end: AtomicUsize,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            frame: AtomicUsize::new(0),
            loop_start: AtomicUsize::new(0),
            loop_end: AtomicUsize::new(NO_LOOP),
        }
    }
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_frame(&self) -> usize {
        self.frame.load(Ordering::Acquire)
    }

    pub fn seek_frame(&self, frame: usize) {
        self.frame.store(frame, Ordering::Release);
    }

    pub fn set_loop(&self, start: usize, end: usize) {
        // Disable first so the audio thread never sees a new start with a stale end.
        self.loop_end.store(NO_LOOP, Ordering::Release);
        self.loop_start.store(start, Ordering::Release);
        self.loop_end.store(end, Ordering::Release);
    }

    pub fn clear_loop(&self) {
        self.loop_end.store(NO_LOOP, Ordering::Release);
    }

    pub fn loop_region(&self) -> Option<(usize, usize)> {
        let end = self.loop_end.load(Ordering::Acquire);
        let start = self.loop_start.load(Ordering::Acquire);
        (end != NO_LOOP && start < end).then_some((start, end))
    }
}

/// Plays a decoded buffer, jumping back to the loop start whenever playback
/// advances onto the loop end.
pub struct LoopingSource {
    data: Arc<AudioBuffer>,
    transport: Arc<Transport>,
    frame: usize,
    channel: usize,
    last_frame: Option<usize>,
}

impl LoopingSource {
    pub fn new(data: Arc<AudioBuffer>, transport: Arc<Transport>) -> Self {
        Self {
            data,
            transport,
            frame: 0,
            channel: 0,
            last_frame: None,
        }
    }

    fn next_frame(&mut self) -> Option<usize> {
        let mut frame = self.transport.position_frame();
        if let (Some(last), Some((start, end))) = (self.last_frame, self.transport.loop_region()) {
            // Only our own advance onto the loop end jumps; foreign seeks are honoured.
            if frame == last + 1 && frame == end {
                let _ = self
                    .transport
                    .frame
                    .compare_exchange(frame, start, Ordering::AcqRel, Ordering::Acquire);
                frame = start;
            }
        }
        (frame < self.data.frame_count as usize).then_some(frame)
    }
}

impl Iterator for LoopingSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let channels = self.data.channels.max(1) as usize;
        if self.channel == 0 {
            self.frame = self.next_frame()?;
        }

        let sample = self.data.samples.get(self.frame * channels + self.channel).copied()?;
        self.channel += 1;

        if self.channel == channels {
            self.channel = 0;
            self.last_frame = Some(self.frame);
            // A seek from the UI thread wins over our own advance.
            let _ = self.transport.frame.compare_exchange(
                self.frame,
                self.frame + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }

        Some(sample)
    }
}

impl Source for LoopingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Seeks and loops make the remaining length unknowable
    }

    fn channels(&self) -> u16 {
        self.data.channels
    }

    fn sample_rate(&self) -> u32 {
        self.data.sample_rate_hz
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// [`Player`] backed by a rodio sink. Without an audio device it still keeps
/// a transport, so positions, seeks and loop regions behave the same.
pub struct RodioPlayer {
    output: Option<(OutputStream, Sink)>,
    transport: Arc<Transport>,
    loaded: Option<Arc<AudioBuffer>>,
    queued: bool,
    playing: bool,
    volume: f32,
}

impl RodioPlayer {
    pub fn new(volume: f32) -> Self {
        let output = match Self::open_output(volume) {
            Ok(output) => Some(output),
            Err(err) => {
                warn!("audio output unavailable, playback disabled: {err}");
                None
            }
        };
        Self {
            output,
            ..Self::headless(volume)
        }
    }

    pub fn headless(volume: f32) -> Self {
        Self {
            output: None,
            transport: Arc::new(Transport::new()),
            loaded: None,
            queued: false,
            playing: false,
            volume,
        }
    }

    fn open_output(volume: f32) -> Result<(OutputStream, Sink), PlayerError> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.pause();
        sink.set_volume(volume);
        Ok((stream, sink))
    }

    pub fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        let buffer = audio::load_audio_file(path)?;
        info!(
            "player loaded {} ({} frames @ {}Hz)",
            path.display(),
            buffer.frame_count,
            buffer.sample_rate_hz
        );
        self.load_buffer(buffer);
        Ok(())
    }

    pub fn load_buffer(&mut self, buffer: AudioBuffer) {
        if let Some((_, sink)) = &self.output {
            sink.stop();
            sink.pause();
        }
        self.transport.clear_loop();
        self.transport.seek_frame(0);
        self.loaded = Some(Arc::new(buffer));
        self.queued = false;
        self.playing = false;
    }

    pub fn unload(&mut self) {
        self.stop();
        self.loaded = None;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some((_, sink)) = &self.output {
            sink.set_volume(volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    fn ms_to_frame(&self, ms: f64) -> usize {
        let Some(data) = &self.loaded else {
            return 0;
        };
        let frame = (ms.max(0.0) * data.sample_rate_hz as f64 / 1000.0).round() as usize;
        frame.min(data.frame_count as usize)
    }

    fn finished(&self) -> bool {
        match (&self.output, &self.loaded) {
            (Some((_, sink)), _) => self.queued && sink.empty(),
            (None, Some(data)) => self.transport.position_frame() >= data.frame_count as usize,
            (None, None) => true,
        }
    }
}

impl Player for RodioPlayer {
    fn current_position_ms(&self) -> u64 {
        match &self.loaded {
            Some(data) if data.sample_rate_hz > 0 => {
                self.transport.position_frame() as u64 * 1000 / data.sample_rate_hz as u64
            }
            _ => 0,
        }
    }

    fn seek(&mut self, ms: f64) {
        let frame = self.ms_to_frame(ms);
        self.transport.seek_frame(frame);
    }

    fn play(&mut self) {
        let Some(data) = self.loaded.clone() else {
            return;
        };
        if self.transport.position_frame() >= data.frame_count as usize {
            self.transport.seek_frame(0);
        }
        if let Some((_, sink)) = &self.output {
            if !self.queued || sink.empty() {
                sink.append(LoopingSource::new(data, self.transport.clone()));
                self.queued = true;
            }
            sink.play();
        }
        self.playing = true;
    }

    fn stop(&mut self) {
        if let Some((_, sink)) = &self.output {
            sink.pause();
        }
        self.transport.seek_frame(0);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing && self.loaded.is_some() && !self.finished()
    }

    fn set_loop_region(&mut self, a_ms: f64, b_ms: f64) {
        let (start, end) = (self.ms_to_frame(a_ms), self.ms_to_frame(b_ms));
        self.transport.set_loop(start, end);
    }

    fn clear_loop_region(&mut self) {
        self.transport.clear_loop();
    }
}

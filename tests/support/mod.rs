#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver};
use loopscope::audio::{AudioBuffer, SampleDecoder};
use loopscope::error::DecodeError;
use loopscope::{Player, SampleCatalog, SelectionSource, Settings, WaveformEvent, WaveformView};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Seek(f64),
    Play,
    Stop,
    SetLoop(f64, f64),
    ClearLoop,
}

#[derive(Default)]
pub struct RecordingPlayer {
    pub calls: Vec<Call>,
    pub position_ms: u64,
    pub playing: bool,
}

impl RecordingPlayer {
    /// Calls other than loop clearing, which the view issues on every reset.
    pub fn commands(&self) -> Vec<Call> {
        self.calls.iter().filter(|call| **call != Call::ClearLoop).cloned().collect()
    }
}

impl Player for RecordingPlayer {
    fn current_position_ms(&self) -> u64 {
        self.position_ms
    }

    fn seek(&mut self, ms: f64) {
        self.calls.push(Call::Seek(ms));
        self.position_ms = ms as u64;
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
        self.playing = true;
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_loop_region(&mut self, a_ms: f64, b_ms: f64) {
        self.calls.push(Call::SetLoop(a_ms, b_ms));
    }

    fn clear_loop_region(&mut self) {
        self.calls.push(Call::ClearLoop);
    }
}

#[derive(Default)]
pub struct FixedCatalog {
    durations: HashMap<String, u64>,
}

impl FixedCatalog {
    pub fn with(mut self, name: &str, duration_ms: u64) -> Self {
        self.durations.insert(name.to_owned(), duration_ms);
        self
    }
}

impl SampleCatalog for FixedCatalog {
    fn path_of(&self, name: &str) -> Option<PathBuf> {
        self.durations.contains_key(name).then(|| PathBuf::from(format!("/samples/{name}")))
    }

    fn extension_of(&self, name: &str) -> Option<String> {
        Path::new(name).extension().map(|ext| ext.to_string_lossy().into_owned())
    }

    fn duration_ms_of(&self, name: &str) -> Option<u64> {
        self.durations.get(name).copied()
    }
}

#[derive(Default)]
pub struct ManualSelection {
    pub current: Option<String>,
}

impl SelectionSource for ManualSelection {
    fn current_selection(&self) -> Option<String> {
        self.current.clone()
    }
}

pub struct ToneDecoder;

impl SampleDecoder for ToneDecoder {
    fn decode(&self, _path: &Path) -> Result<AudioBuffer, DecodeError> {
        Ok(AudioBuffer::new(1, 1_000, vec![0.5; 120_000]))
    }
}

pub type TestView = WaveformView<FixedCatalog, RecordingPlayer, ManualSelection>;

/// A view over a 120s sample named `loop.wav`, already selected, 1000px wide.
pub fn view_with_sample() -> (TestView, Receiver<WaveformEvent>) {
    let (sender, events) = unbounded();
    let settings = Settings {
        resize_debounce_ms: 0,
        ..Settings::default()
    };
    let mut view = WaveformView::new(
        FixedCatalog::default().with("loop.wav", 120_000),
        RecordingPlayer::default(),
        ManualSelection {
            current: Some("loop.wav".into()),
        },
        Box::new(ToneDecoder),
        &settings,
        sender,
    );
    view.set_viewport(loopscope::render::Viewport::new(1_000, 100));
    view.sync_selection();
    (view, events)
}

pub mod audio;
pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gui;
pub mod mapper;
pub mod player;
pub mod playhead;
pub mod render;
pub mod selector;
pub mod view;

pub use collaborators::{Player, SampleCatalog, SelectionSource};
pub use config::Settings;
pub use view::WaveformView;

/// A/B loop region in milliseconds, `a_ms <= b_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopPoints {
    pub a_ms: f64,
    pub b_ms: f64,
}

/// Notifications produced by the waveform core for the surrounding UI.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveformEvent {
    LoopPointsUpdated { a_ms: f64, b_ms: f64 },
    StatusMessage(String),
    SeekRequested(f64),
}

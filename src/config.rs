use std::path::Path;
use std::time::Duration;

use egui::{Color32, Modifiers};
use serde::Deserialize;

use crate::error::ConfigError;

/// Modifier key that arms loop-region selection.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoopModifier {
    Shift,
    Alt,
    Ctrl,
    /// Cmd on macOS, Ctrl elsewhere.
    Command,
}

impl LoopModifier {
    pub fn is_held(self, modifiers: &Modifiers) -> bool {
        match self {
            LoopModifier::Shift => modifiers.shift,
            LoopModifier::Alt => modifiers.alt,
            LoopModifier::Ctrl => modifiers.ctrl,
            LoopModifier::Command => modifiers.command,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub waveform_colour: [u8; 3],
    pub selection_colour: [u8; 3],
    pub playhead_colour: [u8; 3],
    pub loop_modifier: LoopModifier,
    pub resize_debounce_ms: u64, // Resize must settle this long before the envelope is rebuilt
    pub playhead_hover_px: f32,
    pub playhead_grab_zone_px: f32, // Height of the strip at the top where the playhead can be grabbed
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            waveform_colour: [110, 180, 255],
            selection_colour: [255, 200, 80],
            playhead_colour: [240, 240, 240],
            loop_modifier: LoopModifier::Shift,
            resize_debounce_ms: 150,
            playhead_hover_px: 5.0,
            playhead_grab_zone_px: 12.0,
            volume: 0.8,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn waveform_colour(&self) -> Color32 {
        rgb(self.waveform_colour)
    }

    pub fn selection_colour(&self) -> Color32 {
        rgb(self.selection_colour)
    }

    pub fn playhead_colour(&self) -> Color32 {
        rgb(self.playhead_colour)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

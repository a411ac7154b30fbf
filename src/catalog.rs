use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::audio;
use crate::collaborators::{SampleCatalog, SelectionSource};
use crate::error::DecodeError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleEntry {
    pub path: PathBuf,
    pub extension: String,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    entries: BTreeMap<String, SampleEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: SampleEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Probe `path` and register it under its file name, which is returned.
    pub fn add_file(&mut self, path: &Path) -> Result<String, DecodeError> {
        let duration_ms = audio::probe_duration_ms(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        info!("catalogued {name} ({duration_ms}ms)");
        self.insert(
            name.clone(),
            SampleEntry {
                path: path.to_path_buf(),
                extension,
                duration_ms,
            },
        );
        Ok(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SampleCatalog for MemoryCatalog {
    fn path_of(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).map(|entry| entry.path.clone())
    }

    fn extension_of(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.extension.clone())
    }

    fn duration_ms_of(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|entry| entry.duration_ms)
    }
}

/// Selection held by the browser list.
#[derive(Clone, Debug, Default)]
pub struct ListSelection {
    current: Option<String>,
}

impl ListSelection {
    pub fn select(&mut self, name: Option<String>) {
        self.current = name;
    }
}

impl SelectionSource for ListSelection {
    fn current_selection(&self) -> Option<String> {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_by_name() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(
            "kick.wav",
            SampleEntry {
                path: PathBuf::from("/samples/kick.wav"),
                extension: "wav".into(),
                duration_ms: 420,
            },
        );
        assert_eq!(catalog.path_of("kick.wav"), Some(PathBuf::from("/samples/kick.wav")));
        assert_eq!(catalog.extension_of("kick.wav").as_deref(), Some("wav"));
        assert_eq!(catalog.duration_ms_of("kick.wav"), Some(420));
        assert_eq!(catalog.duration_ms_of("snare.wav"), None);
    }

    #[test]
    fn missing_file_is_not_catalogued() {
        let mut catalog = MemoryCatalog::new();
        assert!(catalog.add_file(Path::new("/nope/missing.wav")).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn selection_reports_current_name() {
        let mut selection = ListSelection::default();
        assert_eq!(selection.current_selection(), None);
        selection.select(Some("hat.wav".into()));
        assert_eq!(selection.current_selection().as_deref(), Some("hat.wav"));
    }
}

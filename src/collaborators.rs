use std::path::PathBuf;

/// Lookup of sample metadata by name.
pub trait SampleCatalog {
    fn path_of(&self, name: &str) -> Option<PathBuf>;
    fn extension_of(&self, name: &str) -> Option<String>;
    fn duration_ms_of(&self, name: &str) -> Option<u64>;
}

/// Playback transport. Loop playback is the player's job: once a region is
/// set, reaching `b_ms` during playback seeks back to `a_ms`.
pub trait Player {
    fn current_position_ms(&self) -> u64;
    fn seek(&mut self, ms: f64);
    fn play(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn set_loop_region(&mut self, a_ms: f64, b_ms: f64);
    fn clear_loop_region(&mut self);
}

/// Which sample is active in the browser, if any.
pub trait SelectionSource {
    fn current_selection(&self) -> Option<String>;
}

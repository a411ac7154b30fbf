use std::path::PathBuf;
use std::time::Instant;

use crossbeam_channel::Sender;
use egui::{Color32, Pos2};
use log::{debug, info};

use crate::audio::SampleDecoder;
use crate::collaborators::{Player, SampleCatalog, SelectionSource};
use crate::config::Settings;
use crate::mapper::TimeMapper;
use crate::playhead::{CursorHint, PlayheadController};
use crate::render::{RenderCache, RenderOutcome, Viewport};
use crate::selector::{LoopSelector, ModifierOutcome, PointerCapture};
use crate::{LoopPoints, WaveformEvent};

/// Press and release closer than this count as a click rather than a drag.
const CLICK_SLOP_PX: f32 = 3.0;

/// Input and paint entry points are no-ops while no sample is active.
pub struct WaveformView<C, P, S> {
    catalog: C,
    player: P,
    selection: S,
    cache: RenderCache,
    selector: LoopSelector,
    capture: PointerCapture,
    playhead: PlayheadController,
    events: Sender<WaveformEvent>,
    viewport: Viewport,
    active: Option<String>,
    press: Option<Pos2>,
}

impl<C, P, S> WaveformView<C, P, S>
where
    C: SampleCatalog,
    P: Player,
    S: SelectionSource,
{
    pub fn new(
        catalog: C,
        player: P,
        selection: S,
        decoder: Box<dyn SampleDecoder>,
        settings: &Settings,
        events: Sender<WaveformEvent>,
    ) -> Self {
        let capture = PointerCapture::new();
        Self {
            catalog,
            player,
            selection,
            cache: RenderCache::new(decoder, settings.waveform_colour(), settings.resize_debounce()),
            selector: LoopSelector::new(capture.clone()),
            capture,
            playhead: PlayheadController::new(settings.playhead_hover_px, settings.playhead_grab_zone_px),
            events,
            viewport: Viewport::default(),
            active: None,
            press: None,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn selection_mut(&mut self) -> &mut S {
        &mut self.selection
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn selector(&self) -> &LoopSelector {
        &self.selector
    }

    pub fn capture(&self) -> &PointerCapture {
        &self.capture
    }

    pub fn active_sample(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn loop_points(&self) -> Option<LoopPoints> {
        self.selector.loop_points()
    }

    /// Pick up a change of active sample. Returns `true` when it changed.
    pub fn sync_selection(&mut self) -> bool {
        let current = self.selection.current_selection();
        if current == self.active {
            return false;
        }
        info!("active sample changed to {:?}", current);
        self.active = current;
        self.press = None;
        self.cache.invalidate();
        self.reset_loop();
        true
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            debug!("viewport resized to {}x{}", viewport.width, viewport.height);
            self.viewport = viewport;
        }
    }

    pub fn set_colour(&mut self, colour: Color32) {
        self.cache.set_colour(colour);
    }

    /// Bring the cached bitmap up to date for the current sample and viewport.
    pub fn ensure_rendered(&mut self, now: Instant) -> RenderOutcome {
        self.sync_selection();
        let path = self.active_path();
        self.cache.ensure_up_to_date(self.viewport, path.as_deref(), now)
    }

    pub fn mapper(&self) -> Option<TimeMapper> {
        let name = self.active.as_deref()?;
        let duration_ms = self.catalog.duration_ms_of(name)?;
        TimeMapper::new(self.viewport.width as f32, duration_ms as f64)
    }

    /// Playhead x offset for this frame, read fresh from the player.
    pub fn playhead_x(&self) -> Option<f32> {
        let mapper = self.mapper()?;
        Some(self.playhead.playhead_x(self.player.current_position_ms(), &mapper))
    }

    pub fn hover(&self, pos: Pos2) -> CursorHint {
        if self.active.is_none() {
            return CursorHint::Default;
        }
        if self.selector.modifier_held() || self.selector.is_selecting() {
            return CursorHint::Text;
        }
        match self.playhead_x() {
            Some(x) => self.playhead.cursor_hint(pos, x),
            None => CursorHint::Default,
        }
    }

    pub fn modifier_changed(&mut self, held: bool) {
        if self.active.is_none() {
            self.selector.clear();
            return;
        }
        if self.selector.set_modifier(held) == ModifierOutcome::Cancelled {
            self.press = None;
            self.player.clear_loop_region();
        }
    }

    pub fn pointer_down(&mut self, pos: Pos2) {
        if self.mapper().is_none() {
            return;
        }
        if self.selector.pointer_down(pos) {
            self.press = None;
        } else if !self.selector.modifier_held() {
            self.press = Some(pos);
        }
    }

    pub fn pointer_moved(&mut self, pos: Pos2) {
        self.selector.pointer_moved(pos);
    }

    pub fn pointer_up(&mut self, pos: Pos2) {
        let press = self.press.take();
        let Some(mapper) = self.mapper() else {
            // Unmappable geometry: only a drag in flight is dropped, with the player told.
            if self.selector.is_selecting() {
                self.reset_loop();
            }
            return;
        };

        if self.selector.is_selecting() {
            match self.selector.pointer_up(pos, &mapper) {
                Some(points) => {
                    self.player.set_loop_region(points.a_ms, points.b_ms);
                    self.emit(WaveformEvent::LoopPointsUpdated {
                        a_ms: points.a_ms,
                        b_ms: points.b_ms,
                    });
                }
                None => self.player.clear_loop_region(),
            }
            return;
        }

        let is_click = press.is_some_and(|press| press.distance(pos) <= CLICK_SLOP_PX);
        if is_click && !self.selector.modifier_held() {
            self.click(pos.x, &mapper);
        }
    }

    /// Stop pressed: playback stops and any loop region is discarded.
    pub fn stop(&mut self) {
        self.player.stop();
        self.clear_loop();
    }

    /// Explicit reset: drop the loop region and redraw from scratch.
    pub fn clear_loop(&mut self) {
        self.reset_loop();
        self.cache.invalidate();
    }

    fn click(&mut self, x: f32, mapper: &TimeMapper) {
        let Some(name) = self.active.clone() else {
            return;
        };
        let seek_ms = mapper.pixel_to_time(x).clamp(0.0, mapper.duration_ms());
        self.player.seek(seek_ms);
        self.player.play();
        self.emit(WaveformEvent::SeekRequested(seek_ms));
        self.emit(WaveformEvent::StatusMessage(format!("Now playing: {name}")));
    }

    fn reset_loop(&mut self) {
        self.selector.clear();
        self.player.clear_loop_region();
    }

    fn active_path(&self) -> Option<PathBuf> {
        self.catalog.path_of(self.active.as_deref()?)
    }

    fn emit(&self, event: WaveformEvent) {
        if self.events.send(event).is_err() {
            debug!("waveform event dropped: receiver closed");
        }
    }
}

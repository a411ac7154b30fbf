use std::cell::Cell;
use std::rc::Rc;

use egui::{Pos2, Rect};
use log::debug;

use crate::mapper::TimeMapper;
use crate::LoopPoints;

/// Exclusive pointer-capture slot shared by the waveform widget.
#[derive(Clone, Debug, Default)]
pub struct PointerCapture {
    held: Rc<Cell<bool>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_captured(&self) -> bool {
        self.held.get()
    }

    pub fn acquire(&self) -> CaptureGuard {
        self.held.set(true);
        CaptureGuard {
            held: self.held.clone(),
        }
    }
}

/// Releases the capture when dropped.
#[derive(Debug)]
pub struct CaptureGuard {
    held: Rc<Cell<bool>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

#[derive(Debug, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Armed,
    Selecting {
        anchor: Pos2,
        current: Pos2,
        _capture: CaptureGuard, // dropped on any transition out of Selecting
    },
    Selected {
        anchor: Pos2,
        current: Pos2,
        points: LoopPoints,
    },
}

/// Outcome of a modifier change, for callers that must react to cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierOutcome {
    Unchanged,
    Armed,
    Disarmed,
    Cancelled,
}

#[derive(Debug)]
pub struct LoopSelector {
    state: SelectionState,
    capture: PointerCapture,
    modifier_held: bool,
}

impl LoopSelector {
    pub fn new(capture: PointerCapture) -> Self {
        Self {
            state: SelectionState::Idle,
            capture,
            modifier_held: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SelectionState::Armed)
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier_held
    }

    /// Feed the current modifier state. Safe to call every frame.
    pub fn set_modifier(&mut self, held: bool) -> ModifierOutcome {
        self.modifier_held = held;
        let idle = matches!(self.state, SelectionState::Idle);
        let armed = matches!(self.state, SelectionState::Armed);
        let selecting = self.is_selecting();

        if held && idle {
            self.state = SelectionState::Armed;
            ModifierOutcome::Armed
        } else if !held && armed {
            self.state = SelectionState::Idle;
            ModifierOutcome::Disarmed
        } else if !held && selecting {
            self.state = SelectionState::Idle;
            debug!("loop selection cancelled by modifier release");
            ModifierOutcome::Cancelled
        } else {
            ModifierOutcome::Unchanged
        }
    }

    /// Start a drag if armed, or if a region is selected and the modifier is
    /// held again. Returns `true` when the press was taken.
    pub fn pointer_down(&mut self, pos: Pos2) -> bool {
        let can_start = match self.state {
            SelectionState::Armed => true,
            SelectionState::Selected { .. } => self.modifier_held,
            _ => false,
        };
        if !can_start {
            return false;
        }
        self.state = SelectionState::Selecting {
            anchor: pos,
            current: pos,
            _capture: self.capture.acquire(),
        };
        true
    }

    pub fn pointer_moved(&mut self, pos: Pos2) {
        if let SelectionState::Selecting { current, .. } = &mut self.state {
            *current = pos;
        }
    }

    /// Finish a drag. The lower x always maps to `a_ms`. A drag with no
    /// horizontal extent selects nothing.
    pub fn pointer_up(&mut self, pos: Pos2, mapper: &TimeMapper) -> Option<LoopPoints> {
        let SelectionState::Selecting { anchor, .. } = self.state else {
            return None;
        };
        let current = pos;
        let (left, right) = (anchor.x.min(current.x), anchor.x.max(current.x));

        if left == right {
            self.state = SelectionState::Idle;
            return None;
        }

        let points = LoopPoints {
            a_ms: mapper.pixel_to_time(left),
            b_ms: mapper.pixel_to_time(right),
        };
        self.state = SelectionState::Selected {
            anchor,
            current,
            points,
        };
        debug!("loop region selected: {:.1}ms..{:.1}ms", points.a_ms, points.b_ms);
        Some(points)
    }

    /// Discard any selection or drag in progress.
    pub fn clear(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Loop points, only while a region is selected.
    pub fn loop_points(&self) -> Option<LoopPoints> {
        match self.state {
            SelectionState::Selected { points, .. } => Some(points),
            _ => None,
        }
    }

    /// Transient rectangle between anchor and pointer while dragging.
    pub fn drag_rect(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Selecting { anchor, current, .. } => Some(Rect::from_two_pos(anchor, current)),
            _ => None,
        }
    }

    /// Horizontal extent of the completed selection.
    pub fn selected_band(&self) -> Option<(f32, f32)> {
        match self.state {
            SelectionState::Selected { anchor, current, .. } => Some((anchor.x.min(current.x), anchor.x.max(current.x))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn selector() -> (LoopSelector, PointerCapture) {
        let capture = PointerCapture::new();
        (LoopSelector::new(capture.clone()), capture)
    }

    fn mapper() -> TimeMapper {
        TimeMapper::new(1_000.0, 120_000.0).unwrap()
    }

    #[test]
    fn modifier_arms_and_disarms() {
        let (mut selector, _) = selector();
        assert_eq!(selector.set_modifier(true), ModifierOutcome::Armed);
        assert!(selector.is_armed());
        assert_eq!(selector.set_modifier(true), ModifierOutcome::Unchanged);
        assert_eq!(selector.set_modifier(false), ModifierOutcome::Disarmed);
        assert!(matches!(selector.state(), SelectionState::Idle));
    }

    #[test]
    fn press_without_modifier_is_ignored() {
        let (mut selector, capture) = selector();
        assert!(!selector.pointer_down(pos2(10.0, 5.0)));
        assert!(!capture.is_captured());
    }

    #[test]
    fn backwards_drag_orders_loop_points() {
        let (mut selector, capture) = selector();
        selector.set_modifier(true);
        assert!(selector.pointer_down(pos2(300.0, 20.0)));
        assert!(capture.is_captured());
        selector.pointer_moved(pos2(180.0, 30.0));
        assert!(selector.drag_rect().is_some());
        let points = selector.pointer_up(pos2(100.0, 30.0), &mapper()).unwrap();
        assert!(!capture.is_captured());
        assert!((points.a_ms - 12_000.0).abs() < 1e-6);
        assert!((points.b_ms - 36_000.0).abs() < 1e-6);
        assert_eq!(selector.loop_points(), Some(points));
        assert_eq!(selector.selected_band(), Some((100.0, 300.0)));
        assert!(selector.drag_rect().is_none());
    }

    #[test]
    fn modifier_release_mid_drag_cancels_and_releases_capture() {
        let (mut selector, capture) = selector();
        selector.set_modifier(true);
        selector.pointer_down(pos2(50.0, 10.0));
        selector.pointer_moved(pos2(90.0, 10.0));
        assert_eq!(selector.set_modifier(false), ModifierOutcome::Cancelled);
        assert!(!capture.is_captured());
        assert!(selector.drag_rect().is_none());
        assert_eq!(selector.pointer_up(pos2(90.0, 10.0), &mapper()), None);
        assert_eq!(selector.loop_points(), None);
    }

    #[test]
    fn clear_discards_selection() {
        let (mut selector, _) = selector();
        selector.set_modifier(true);
        selector.pointer_down(pos2(10.0, 0.0));
        selector.pointer_up(pos2(20.0, 0.0), &mapper());
        selector.set_modifier(false);
        assert!(selector.loop_points().is_some());
        selector.clear();
        assert_eq!(selector.loop_points(), None);
        assert!(selector.selected_band().is_none());
    }

    #[test]
    fn clear_mid_drag_releases_capture() {
        let (mut selector, capture) = selector();
        selector.set_modifier(true);
        selector.pointer_down(pos2(10.0, 0.0));
        selector.clear();
        assert!(!capture.is_captured());
    }

    #[test]
    fn zero_width_drag_selects_nothing() {
        let (mut selector, capture) = selector();
        selector.set_modifier(true);
        selector.pointer_down(pos2(40.0, 0.0));
        assert_eq!(selector.pointer_up(pos2(40.0, 12.0), &mapper()), None);
        assert!(!capture.is_captured());
        assert_eq!(selector.loop_points(), None);
    }

    #[test]
    fn reselect_while_selected_needs_modifier() {
        let (mut selector, _) = selector();
        selector.set_modifier(true);
        selector.pointer_down(pos2(10.0, 0.0));
        selector.pointer_up(pos2(20.0, 0.0), &mapper());
        selector.set_modifier(false);
        assert!(!selector.pointer_down(pos2(500.0, 0.0)));
        selector.set_modifier(true);
        assert!(selector.pointer_down(pos2(500.0, 0.0)));
        let points = selector.pointer_up(pos2(600.0, 0.0), &mapper()).unwrap();
        assert!((points.a_ms - 60_000.0).abs() < 1e-6);
    }
}

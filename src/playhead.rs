use egui::{pos2, Color32, Painter, Pos2, Rect, Shape, Stroke};

use crate::mapper::TimeMapper;

const MARKER_HALF_WIDTH: f32 = 6.0;
const MARKER_HEIGHT: f32 = 8.0;
const LINE_WIDTH: f32 = 1.5;

/// Cursor shape the widget should show; purely visual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    /// Pointer over the playhead handle.
    Grab,
    /// Loop modifier held or a loop drag in progress.
    Text,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayheadController {
    hover_px: f32,
    grab_zone_px: f32,
}

impl PlayheadController {
    pub fn new(hover_px: f32, grab_zone_px: f32) -> Self {
        Self {
            hover_px,
            grab_zone_px,
        }
    }

    pub fn playhead_x(&self, position_ms: u64, mapper: &TimeMapper) -> f32 {
        mapper.time_to_pixel(position_ms as f64)
    }

    /// `Grab` when the pointer is within the hover radius of the playhead and
    /// near the top edge, where the marker triangle sits.
    pub fn cursor_hint(&self, pointer: Pos2, playhead_x: f32) -> CursorHint {
        let near_line = (pointer.x - playhead_x).abs() <= self.hover_px;
        let near_top = pointer.y >= 0.0 && pointer.y <= self.grab_zone_px;
        if near_line && near_top {
            CursorHint::Grab
        } else {
            CursorHint::Default
        }
    }
}

/// Triangle at the top edge plus a full-height vertical line at `x` (local to `rect`).
pub fn paint_playhead(painter: &Painter, rect: Rect, x: f32, colour: Color32) {
    let x = rect.left() + x;
    let top = rect.top();
    let triangle = vec![
        pos2(x - MARKER_HALF_WIDTH, top),
        pos2(x + MARKER_HALF_WIDTH, top),
        pos2(x, top + MARKER_HEIGHT),
    ];
    painter.add(Shape::convex_polygon(triangle, colour, Stroke::NONE));
    painter.line_segment([pos2(x, top), pos2(x, rect.bottom())], Stroke::new(LINE_WIDTH, colour));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playhead_follows_position() {
        let mapper = TimeMapper::new(1_000.0, 120_000.0).unwrap();
        let controller = PlayheadController::new(5.0, 12.0);
        assert_eq!(controller.playhead_x(0, &mapper), 0.0);
        assert_eq!(controller.playhead_x(60_000, &mapper), 500.0);
    }

    #[test]
    fn grab_hint_needs_both_proximity_and_top_edge() {
        let controller = PlayheadController::new(5.0, 12.0);
        assert_eq!(controller.cursor_hint(pos2(204.0, 3.0), 200.0), CursorHint::Grab);
        assert_eq!(controller.cursor_hint(pos2(195.0, 12.0), 200.0), CursorHint::Grab);
        assert_eq!(controller.cursor_hint(pos2(206.0, 3.0), 200.0), CursorHint::Default);
        assert_eq!(controller.cursor_hint(pos2(200.0, 40.0), 200.0), CursorHint::Default);
    }
}

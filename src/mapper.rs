pub fn time_to_pixel(time_ms: f64, width_px: f32, duration_ms: f64) -> f32 {
    (width_px as f64 * (time_ms / duration_ms)) as f32
}

pub fn pixel_to_time(x: f32, width_px: f32, duration_ms: f64) -> f64 {
    (x as f64 / width_px as f64) * duration_ms
}

/// Mapper bound to one viewport width and sample duration.
///
/// Construction fails for degenerate geometry, so callers that hold a
/// `TimeMapper` never divide by zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeMapper {
    width_px: f32,
    duration_ms: f64,
}

impl TimeMapper {
    pub fn new(width_px: f32, duration_ms: f64) -> Option<Self> {
        let valid = width_px.is_finite() && width_px > 0.0 && duration_ms.is_finite() && duration_ms > 0.0;
        valid.then_some(Self {
            width_px,
            duration_ms,
        })
    }

    pub fn width_px(&self) -> f32 {
        self.width_px
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn time_to_pixel(&self, time_ms: f64) -> f32 {
        time_to_pixel(time_ms, self.width_px, self.duration_ms)
    }

    pub fn pixel_to_time(&self, x: f32) -> f64 {
        pixel_to_time(x, self.width_px, self.duration_ms)
    }
}

//! Documented value ranges. Inputs are clamped into these, never rejected.

use std::ops::RangeInclusive;

pub const FONT_SIZE: RangeInclusive<f64> = 8.0..=200.0;
pub const STROKE_WIDTH: RangeInclusive<f64> = 0.0..=50.0;
pub const OPACITY: RangeInclusive<f64> = 0.0..=1.0;
pub const CANVAS_DIMENSION: RangeInclusive<f64> = 100.0..=5000.0;
pub const GRID_SIZE: RangeInclusive<f64> = 5.0..=200.0;
pub const ELEMENT_SCALE: RangeInclusive<f64> = 0.1..=10.0;
pub const GRAYSCALE: RangeInclusive<f64> = 0.0..=100.0;
pub const BRIGHTNESS: RangeInclusive<f64> = 0.0..=200.0;
pub const CONTRAST: RangeInclusive<f64> = 0.0..=200.0;
pub const BLUR: RangeInclusive<f64> = 0.0..=20.0;
pub const SHADOW_BLUR: RangeInclusive<f64> = 0.0..=50.0;
pub const SHADOW_OFFSET: RangeInclusive<f64> = -100.0..=100.0;

/// Smallest width or height an element may be resized to.
pub const MIN_ELEMENT_SIZE: f64 = 10.0;
/// Smallest wrap width for text (must leave room for the side padding).
pub const MIN_TEXT_WIDTH: f64 = 40.0;

/// Clamp `value` into `range`, mapping NaN to the range start.
pub fn clamp(value: f64, range: RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(500.0, FONT_SIZE), 200.0);
        assert_eq!(clamp(1.0, FONT_SIZE), 8.0);
        assert_eq!(clamp(0.5, OPACITY), 0.5);
        assert_eq!(clamp(f64::NAN, OPACITY), 0.0);
    }
}

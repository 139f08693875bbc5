//! Glyph-width oracle for caption layout.
//!
//! The wrapper is generic over measurement so the wrapping logic can be
//! exercised with arbitrary metrics in tests; production uses the metrics
//! of the bitmap font the composer actually draws with, which makes the
//! measurement exact rather than approximate.

/// Measures rendered text width in pixels.
pub trait GlyphMeasure {
    fn width_px(&self, text: &str) -> f32;
}

/// Metrics of the scaled 8×8 bitmap font used by the composer.
///
/// Every glyph cell advances exactly `8 * scale` px, so a wrapped line can
/// never out-measure its rendering.
#[derive(Debug, Clone, Copy)]
pub struct BitmapFontMetrics {
    pub scale: u32,
}

impl BitmapFontMetrics {
    pub const fn new(scale: u32) -> Self {
        BitmapFontMetrics { scale }
    }

    pub fn glyph_advance_px(&self) -> f32 {
        (8 * self.scale.max(1)) as f32
    }

    /// Vertical advance between caption lines: the 8-row glyph cell plus
    /// one scaled row of leading.
    pub fn line_height_px(&self) -> i32 {
        (9 * self.scale.max(1)) as i32
    }
}

impl GlyphMeasure for BitmapFontMetrics {
    fn width_px(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_advance_px()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_counts_chars_not_bytes() {
        let metrics = BitmapFontMetrics::new(2);
        // "привет" is 6 chars, 12 bytes
        assert_eq!(metrics.width_px("привет"), 6.0 * 16.0);
    }

    #[test]
    fn test_empty_string_measures_zero() {
        let metrics = BitmapFontMetrics::new(2);
        assert_eq!(metrics.width_px(""), 0.0);
    }

    #[test]
    fn test_zero_scale_clamps_to_one() {
        let metrics = BitmapFontMetrics::new(0);
        assert_eq!(metrics.glyph_advance_px(), 8.0);
        assert_eq!(metrics.line_height_px(), 9);
    }
}

//! Bounded caption layout — greedy char-by-char line fill against a
//! glyph-width oracle.
//!
//! The overflow test always measures against the original target box. An
//! earlier rendition of this algorithm re-read the bounds from the previous
//! measurement box on later iterations, which made wrapping drift; every
//! line produced here stays within the caller-supplied box whenever the
//! widest single character fits at all.

use crate::layout::metrics::GlyphMeasure;

/// Region of the scene the caption must stay inside, in image pixel
/// coordinates. Corner format: `(x_min, y_min)` top-left, `(x_max, y_max)`
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// Horizontal inset between the box edge and the caption; the vertical
/// inset is half of it.
pub const TEXT_MARGIN_PX: f32 = 40.0;

/// The caption with line breaks inserted, plus the top-left anchor to draw
/// it at.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub text: String,
    pub anchor_x: i32,
    pub anchor_y: i32,
}

impl LayoutResult {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// Greedy line fill: the line is seeded with its first character; for each
/// subsequent character the tentative line is measured from the anchor, and
/// when its right edge passes `x_max - margin` the line breaks — a space at
/// the break point is consumed as the break itself, any other character
/// opens the next line.
///
/// A line always keeps at least one character, so a glyph wider than the
/// usable width produces a one-character (overflowing) line rather than
/// looping.
pub fn wrap_caption(
    text: &str,
    bbox: &BoundingBox,
    metrics: &dyn GlyphMeasure,
    margin: f32,
) -> LayoutResult {
    let anchor_x = (bbox.x_min + margin) as i32;
    let anchor_y = (bbox.y_min + margin / 2.0) as i32;
    let limit = bbox.x_max - margin;

    let mut chars = text.chars();
    let mut wrapped = String::with_capacity(text.len() + 8);
    let mut line = String::new();
    if let Some(first) = chars.next() {
        line.push(first);
    }

    for c in chars {
        if line.is_empty() {
            line.push(c);
            continue;
        }
        let mut candidate = line.clone();
        candidate.push(c);
        let right_edge = anchor_x as f32 + metrics.width_px(&candidate);
        if right_edge > limit {
            wrapped.push_str(&line);
            wrapped.push('\n');
            line.clear();
            if c != ' ' {
                line.push(c);
            }
        } else {
            line = candidate;
        }
    }
    wrapped.push_str(&line);

    LayoutResult {
        text: wrapped,
        anchor_x,
        anchor_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::BitmapFontMetrics;

    /// Fixed-advance toy oracle: every char is `advance` px wide.
    struct Mono {
        advance: f32,
    }

    impl GlyphMeasure for Mono {
        fn width_px(&self, text: &str) -> f32 {
            text.chars().count() as f32 * self.advance
        }
    }

    fn bbox(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> BoundingBox {
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[test]
    fn test_anchor_is_margin_inset_with_half_vertical() {
        let result = wrap_caption("hi", &bbox(100.0, 200.0, 600.0, 500.0), &Mono { advance: 10.0 }, 40.0);
        assert_eq!(result.anchor_x, 140);
        assert_eq!(result.anchor_y, 220);
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let result = wrap_caption("hello", &bbox(0.0, 0.0, 400.0, 300.0), &Mono { advance: 10.0 }, 40.0);
        assert_eq!(result.text, "hello");
    }

    #[test]
    fn test_break_on_space_consumes_the_space() {
        // Box 0..100, margin 20: anchor at 20, limit 80 → 6 chars of 10px fit.
        let result = wrap_caption(
            "abcdef gh",
            &bbox(0.0, 0.0, 100.0, 100.0),
            &Mono { advance: 10.0 },
            20.0,
        );
        assert_eq!(result.text, "abcdef\ngh");
    }

    #[test]
    fn test_break_mid_word_carries_the_char() {
        let result = wrap_caption(
            "abcdefgh",
            &bbox(0.0, 0.0, 100.0, 100.0),
            &Mono { advance: 10.0 },
            20.0,
        );
        assert_eq!(result.text, "abcdef\ngh");
    }

    #[test]
    fn test_every_line_fits_the_original_box() {
        let metrics = BitmapFontMetrics::new(2);
        let boxed = bbox(120.0, 80.0, 560.0, 520.0);
        let captions = [
            "Аддикция - лучший паблик",
            "a longer english caption that definitely wraps a few times",
            "привет как дела сегодня вечером",
            "nospacesatallinthisverylongtokenthatmustbreakmidword",
        ];
        let usable = boxed.width() - 2.0 * TEXT_MARGIN_PX;
        for caption in captions {
            let result = wrap_caption(caption, &boxed, &metrics, TEXT_MARGIN_PX);
            for line in result.lines() {
                assert!(
                    metrics.width_px(line) <= usable,
                    "line {line:?} measures {} > usable {usable}",
                    metrics.width_px(line)
                );
            }
        }
    }

    #[test]
    fn test_wrapped_text_preserves_non_space_chars() {
        let metrics = BitmapFontMetrics::new(2);
        let boxed = bbox(0.0, 0.0, 300.0, 300.0);
        let caption = "привет мир и всем хорошего дня";
        let result = wrap_caption(caption, &boxed, &metrics, TEXT_MARGIN_PX);
        let kept: String = result.text.chars().filter(|c| *c != '\n').collect();
        let original_non_space: String = caption.chars().filter(|c| *c != ' ').collect();
        let kept_non_space: String = kept.chars().filter(|c| *c != ' ').collect();
        assert_eq!(kept_non_space, original_non_space);
    }

    #[test]
    fn test_char_wider_than_box_yields_one_char_lines() {
        // Usable width is 10px, each glyph is 30px: every line is a single
        // overflowing character instead of an infinite loop.
        let result = wrap_caption(
            "abc",
            &bbox(0.0, 0.0, 50.0, 50.0),
            &Mono { advance: 30.0 },
            20.0,
        );
        assert_eq!(result.text, "a\nb\nc");
    }

    #[test]
    fn test_empty_text_yields_empty_layout() {
        let result = wrap_caption("", &bbox(0.0, 0.0, 100.0, 100.0), &Mono { advance: 10.0 }, 20.0);
        assert_eq!(result.text, "");
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let metrics = BitmapFontMetrics::new(2);
        let boxed = bbox(100.0, 100.0, 540.0, 540.0);
        let a = wrap_caption("одно и то же", &boxed, &metrics, TEXT_MARGIN_PX);
        let b = wrap_caption("одно и то же", &boxed, &metrics, TEXT_MARGIN_PX);
        assert_eq!(a, b);
    }
}

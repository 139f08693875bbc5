// Caption layout: glyph-width oracle + bounded greedy line wrapping.
// CPU-only; the composition stage drives it against the detected region.

pub mod metrics;
pub mod wrap;

pub use metrics::{BitmapFontMetrics, GlyphMeasure};
pub use wrap::{wrap_caption, BoundingBox, LayoutResult, TEXT_MARGIN_PX};

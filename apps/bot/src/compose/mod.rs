//! Composition stage — renders the generated scene, lays the caption out
//! inside the detected paper region, and persists the artifact.
//!
//! Flow per reply: scene generation (mood-parameterized prompt) → paper
//! detection → caption wrap → glyph raster → PNG on disk. Artifact paths
//! are namespaced by session id, so parallel passes could never collide on
//! a well-known filename.

pub mod glyphs;

use std::path::PathBuf;
use std::sync::Arc;

use image::Rgba;
use tracing::debug;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::errors::BotError;
use crate::imagegen::ImageGenerator;
use crate::layout::{wrap_caption, BitmapFontMetrics, TEXT_MARGIN_PX};
use crate::vision::RegionDetector;

/// Solid black, like ink on paper.
const CAPTION_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// 8×8 glyph cells scaled ×2 → 16 px caption glyphs.
const CAPTION_GLYPH_SCALE: u32 = 2;

/// Builds the scene prompt for a reply's mood tag.
pub fn scene_prompt(mood: &str) -> String {
    format!(
        "Image of {mood} sks anime girl on white background, \
         she holds a white piece of paper in her hands"
    )
}

pub struct Composer {
    imagegen: Arc<dyn ImageGenerator>,
    detector: Arc<dyn RegionDetector>,
    metrics: BitmapFontMetrics,
    content_dir: PathBuf,
}

impl Composer {
    pub fn new(
        imagegen: Arc<dyn ImageGenerator>,
        detector: Arc<dyn RegionDetector>,
        content_dir: PathBuf,
    ) -> Self {
        Composer {
            imagegen,
            detector,
            metrics: BitmapFontMetrics::new(CAPTION_GLYPH_SCALE),
            content_dir,
        }
    }

    /// Runs the full composition pass for one reply and returns the handle
    /// to the persisted artifact.
    pub async fn compose(
        &self,
        session_id: Uuid,
        caption: &str,
        mood: &str,
    ) -> Result<Artifact, BotError> {
        let png = self.imagegen.generate(&scene_prompt(mood)).await?;
        let mut scene = image::load_from_memory(&png)?.to_rgba8();
        let bbox = self.detector.detect(&png).await?;
        debug!(
            region_w = bbox.width(),
            region_h = bbox.height(),
            "Paper region detected"
        );

        let layout = wrap_caption(caption, &bbox, &self.metrics, TEXT_MARGIN_PX);
        let mut y = layout.anchor_y;
        for line in layout.lines() {
            glyphs::draw_line(
                &mut scene,
                layout.anchor_x,
                y,
                line,
                CAPTION_COLOR,
                self.metrics.scale,
            );
            y += self.metrics.line_height_px();
        }

        let path = self.content_dir.join(format!("reply-{session_id}.png"));
        scene.save(&path)?;
        debug!(artifact = %path.display(), "Caption composited onto scene");
        Ok(Artifact::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::RgbaImage;

    use crate::layout::BoundingBox;

    struct StaticScene;

    #[async_trait]
    impl ImageGenerator for StaticScene {
        async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, BotError> {
            let img = RgbaImage::from_pixel(640, 640, Rgba([255, 255, 255, 255]));
            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut buf, image::ImageFormat::Png)
                .unwrap();
            Ok(buf.into_inner())
        }
    }

    struct FixedRegion;

    #[async_trait]
    impl RegionDetector for FixedRegion {
        async fn detect(&self, _png: &[u8]) -> Result<BoundingBox, BotError> {
            Ok(BoundingBox {
                x_min: 120.0,
                y_min: 120.0,
                x_max: 520.0,
                y_max: 520.0,
            })
        }
    }

    fn composer(dir: &std::path::Path) -> Composer {
        Composer::new(
            Arc::new(StaticScene),
            Arc::new(FixedRegion),
            dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn test_compose_writes_session_namespaced_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let session_id = Uuid::new_v4();

        let artifact = composer(dir.path())
            .compose(session_id, "Привет!", "happy")
            .await
            .unwrap();
        assert_eq!(
            artifact.path(),
            dir.path().join(format!("reply-{session_id}.png"))
        );
        assert!(artifact.path().exists());
    }

    #[tokio::test]
    async fn test_caption_ink_lands_inside_the_detected_box() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = composer(dir.path())
            .compose(Uuid::new_v4(), "hello paper world", "calm")
            .await
            .unwrap();

        let composed = image::open(artifact.path()).unwrap().to_rgba8();
        let mut ink = 0usize;
        for (x, y, p) in composed.enumerate_pixels() {
            if *p == Rgba([0, 0, 0, 255]) {
                ink += 1;
                assert!(
                    (120..520).contains(&x) && (120..520).contains(&y),
                    "ink at ({x}, {y}) escaped the detected box"
                );
            }
        }
        assert!(ink > 0, "caption should leave ink on the scene");
    }

    #[tokio::test]
    async fn test_artifact_cleaned_up_when_handle_drops() {
        let dir = tempfile::tempdir().unwrap();
        let path;
        {
            let artifact = composer(dir.path())
                .compose(Uuid::new_v4(), "короткая", "sad")
                .await
                .unwrap();
            path = artifact.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_scene_prompt_embeds_mood() {
        let prompt = scene_prompt("happy");
        assert!(prompt.contains("happy"));
        assert!(prompt.contains("piece of paper"));
    }
}

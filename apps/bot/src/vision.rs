//! Paper-region detection client.
//!
//! The hosted model returns center-format predictions; the first one is
//! converted to the corner-format box the layout engine works in.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::BotError;
use crate::layout::BoundingBox;

const DETECT_API_BASE: &str = "https://detect.roboflow.com";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Finds the paper region in an encoded PNG scene.
#[async_trait]
pub trait RegionDetector: Send + Sync {
    async fn detect(&self, png: &[u8]) -> Result<BoundingBox, BotError>;
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

/// Center-format detection: `(x, y)` is the box center.
#[derive(Debug, Deserialize)]
struct Prediction {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Prediction {
    fn bbox(&self) -> BoundingBox {
        BoundingBox {
            x_min: self.x - self.width / 2.0,
            y_min: self.y - self.height / 2.0,
            x_max: self.x + self.width / 2.0,
            y_max: self.y + self.height / 2.0,
        }
    }
}

pub struct RoboflowDetector {
    client: reqwest::Client,
    api_key: String,
    project_id: String,
    version: String,
}

impl RoboflowDetector {
    pub fn new(api_key: String, project_id: String, version: String) -> Self {
        RoboflowDetector {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            project_id,
            version,
        }
    }
}

#[async_trait]
impl RegionDetector for RoboflowDetector {
    async fn detect(&self, png: &[u8]) -> Result<BoundingBox, BotError> {
        let url = format!("{DETECT_API_BASE}/{}/{}", self.project_id, self.version);
        let part = reqwest::multipart::Part::bytes(png.to_vec())
            .file_name("scene.png")
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response: DetectResponse = self
            .client
            .post(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .predictions
            .first()
            .map(Prediction::bbox)
            .ok_or_else(|| BotError::Detection("no paper region detected in the scene".to_string()))
    }
}

//! Remote image-generation client: the "girl holding a blank paper" scene
//! comes back as base64-encoded PNG.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::BotError;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Produces an encoded PNG scene for a prompt. Tests substitute a static
/// scene.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BotError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    remote_generated_image_in_base64_format: Option<String>,
}

pub struct RemoteImageServer {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteImageServer {
    pub fn new(base_url: String) -> Self {
        RemoteImageServer {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }
}

#[async_trait]
impl ImageGenerator for RemoteImageServer {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BotError> {
        let url = format!(
            "{}/get_remote_generated_image",
            self.base_url.trim_end_matches('/')
        );
        let response: GenerateResponse = self
            .client
            .post(&url)
            .json(&GenerateRequest { prompt })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let encoded = response
            .remote_generated_image_in_base64_format
            .ok_or_else(|| BotError::MalformedResponse {
                service: "imagegen".to_string(),
                detail: "response carried no image payload".to_string(),
            })?;
        let bytes = STANDARD.decode(encoded.as_bytes())?;
        debug!(bytes = bytes.len(), "Scene image received");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_response_parses_payload() {
        let json = r#"{"remote_generated_image_in_base64_format": "aGVsbG8="}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        let bytes = STANDARD
            .decode(parsed.remote_generated_image_in_base64_format.unwrap())
            .unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_generate_response_tolerates_missing_payload() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.remote_generated_image_in_base64_format.is_none());
    }
}

//! VK wall bindings — typed wrappers over the handful of methods the bot
//! calls.
//!
//! Reads and photo uploads run under the user token; publishing the reply
//! comment runs under the group token so it appears as the community.

pub mod types;

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::errors::BotError;
use crate::threads::CommentItem;
use crate::vk::types::{
    CommentsResponse, CreatedComment, SavedPhoto, UploadServer, VkEnvelope, WallGetResponse,
    WallPhotoUpload,
};

const VK_API_BASE: &str = "https://api.vk.com/method";
const VK_API_VERSION: &str = "5.199";
const REQUEST_TIMEOUT_SECS: u64 = 60;
/// Top-level comments fetched per snapshot.
const COMMENT_PAGE_SIZE: u32 = 100;
/// Nested replies fetched per thread.
const THREAD_ITEMS_COUNT: u32 = 10;

/// Wall read/publish surface the poll loop depends on.
#[async_trait]
pub trait Wall: Send + Sync {
    /// Id of the post whose comments the bot watches.
    async fn latest_post_id(&self) -> Result<i64, BotError>;

    /// Full comment snapshot for the post, nested replies included.
    async fn fetch_comments(&self, post_id: i64) -> Result<Vec<CommentItem>, BotError>;

    /// Uploads the artifact and posts it as a reply to `comment_id`.
    /// Returns the attachment reference.
    async fn publish_reply(
        &self,
        post_id: i64,
        comment_id: i64,
        artifact: &Path,
    ) -> Result<String, BotError>;
}

pub struct VkClient {
    client: reqwest::Client,
    user_token: String,
    group_token: String,
    /// Owner id of the community wall (negative for communities); doubles
    /// as the account id the bot posts under.
    owner_id: i64,
}

impl VkClient {
    pub fn new(user_token: String, group_token: String, owner_id: i64) -> Self {
        VkClient {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            user_token,
            group_token,
            owner_id,
        }
    }

    /// Calls one API method and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> Result<T, BotError> {
        let url = format!("{VK_API_BASE}/{method}");
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("access_token", token.to_string()));
        query.push(("v", VK_API_VERSION.to_string()));

        let envelope: VkEnvelope<T> = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(BotError::VkApi {
                method: method.to_string(),
                message: format!("{} (code {})", error.error_msg, error.error_code),
            });
        }
        envelope.response.ok_or_else(|| BotError::MalformedResponse {
            service: "vk".to_string(),
            detail: format!("{method}: neither response nor error present"),
        })
    }

    /// Uploads the artifact to the wall photo server and saves it.
    /// Returns the `photo{owner}_{id}` attachment string.
    async fn upload_artifact(&self, artifact: &Path) -> Result<String, BotError> {
        let group = self.owner_id.unsigned_abs();

        let server: UploadServer = self
            .call(
                "photos.getWallUploadServer",
                &self.user_token,
                &[("group_id", group.to_string())],
            )
            .await?;

        let bytes = tokio::fs::read(artifact).await?;
        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact.png")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("photo", part);

        let uploaded: WallPhotoUpload = self
            .client
            .post(&server.upload_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let saved: Vec<SavedPhoto> = self
            .call(
                "photos.saveWallPhoto",
                &self.user_token,
                &[
                    ("group_id", group.to_string()),
                    ("photo", uploaded.photo),
                    ("server", uploaded.server.to_string()),
                    ("hash", uploaded.hash),
                ],
            )
            .await?;

        let photo = saved.first().ok_or_else(|| BotError::MalformedResponse {
            service: "vk".to_string(),
            detail: "photos.saveWallPhoto returned no photos".to_string(),
        })?;
        Ok(format!("photo{}_{}", photo.owner_id, photo.id))
    }
}

#[async_trait]
impl Wall for VkClient {
    async fn latest_post_id(&self) -> Result<i64, BotError> {
        let wall: WallGetResponse = self
            .call(
                "wall.get",
                &self.user_token,
                &[("owner_id", self.owner_id.to_string())],
            )
            .await?;

        // The newest wall item is the community's pinned post; the item
        // after it is the one the bot watches. A single-post wall falls
        // back to that post.
        wall.items
            .get(1)
            .or_else(|| wall.items.first())
            .map(|post| post.id)
            .ok_or_else(|| BotError::MalformedResponse {
                service: "vk".to_string(),
                detail: "wall.get returned no posts".to_string(),
            })
    }

    async fn fetch_comments(&self, post_id: i64) -> Result<Vec<CommentItem>, BotError> {
        let comments: CommentsResponse = self
            .call(
                "wall.getComments",
                &self.user_token,
                &[
                    ("owner_id", self.owner_id.to_string()),
                    ("post_id", post_id.to_string()),
                    ("count", COMMENT_PAGE_SIZE.to_string()),
                    ("extended", "0".to_string()),
                    ("thread_items_count", THREAD_ITEMS_COUNT.to_string()),
                ],
            )
            .await?;

        Ok(comments
            .items
            .into_iter()
            .map(CommentItem::from)
            .collect())
    }

    async fn publish_reply(
        &self,
        post_id: i64,
        comment_id: i64,
        artifact: &Path,
    ) -> Result<String, BotError> {
        let attachment = self.upload_artifact(artifact).await?;

        let created: CreatedComment = self
            .call(
                "wall.createComment",
                &self.group_token,
                &[
                    ("owner_id", self.owner_id.to_string()),
                    ("post_id", post_id.to_string()),
                    ("reply_to_comment", comment_id.to_string()),
                    ("attachments", attachment.clone()),
                    ("from_group", "1".to_string()),
                ],
            )
            .await?;

        info!(
            comment = comment_id,
            reply = created.comment_id,
            attachment = %attachment,
            "Reply published"
        );
        Ok(attachment)
    }
}

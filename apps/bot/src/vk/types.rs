//! Wire types for the VK API envelope and the wall methods the bot calls.

use serde::Deserialize;

use crate::threads::CommentItem;

/// Every VK method responds with either `response` or `error`.
#[derive(Debug, Deserialize)]
pub struct VkEnvelope<T> {
    pub response: Option<T>,
    pub error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
pub struct VkApiError {
    pub error_code: i64,
    pub error_msg: String,
}

#[derive(Debug, Deserialize)]
pub struct WallGetResponse {
    #[serde(default)]
    pub items: Vec<WallPost>,
}

#[derive(Debug, Deserialize)]
pub struct WallPost {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub items: Vec<RawComment>,
}

/// One comment as the API returns it. Fields the API omits on deleted or
/// restricted comments default instead of failing the whole snapshot.
#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub id: i64,
    pub from_id: Option<i64>,
    #[serde(default)]
    pub text: String,
    pub reply_to_user: Option<i64>,
    pub thread: Option<RawThread>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawThread {
    #[serde(default)]
    pub items: Vec<RawComment>,
}

impl From<RawComment> for CommentItem {
    fn from(raw: RawComment) -> Self {
        CommentItem {
            id: raw.id,
            author_id: raw.from_id,
            text: raw.text,
            reply_to_user_id: raw.reply_to_user,
            replies: raw
                .thread
                .map(|t| t.items.into_iter().map(CommentItem::from).collect())
                .unwrap_or_default(),
        }
    }
}

// ── photo upload ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadServer {
    pub upload_url: String,
}

/// Raw response from the upload server itself (not envelope-wrapped).
/// `photo` is a JSON-encoded string the save call passes through verbatim.
#[derive(Debug, Deserialize)]
pub struct WallPhotoUpload {
    pub server: i64,
    pub photo: String,
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct SavedPhoto {
    pub id: i64,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreatedComment {
    pub comment_id: i64,
}

use thiserror::Error;

/// Application-level error type shared across the reply pipeline.
///
/// A failed thread carries one of these back to the poll loop, which logs
/// it and moves on to the next thread — the poll cadence is never broken
/// by a per-thread failure.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("VK API error in {method}: {message}")]
    VkApi { method: String, message: String },

    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm_client::LlmError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Malformed response from {service}: {detail}")]
    MalformedResponse { service: String, detail: String },

    #[error("Empty thread: no turns to answer")]
    EmptyThread,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

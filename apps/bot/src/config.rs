use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails before the poll loop ever runs if a required variable is
/// missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// User-scope token: wall reads and photo uploads.
    pub user_token: String,
    /// Group-scope token: publishing reply comments as the community.
    pub group_token: String,
    /// Community owner id as the wall API expects it (negative for groups).
    pub group_id: i64,
    pub openai_api_key: String,
    pub llm_model: String,
    pub roboflow_api_key: String,
    pub roboflow_project_id: String,
    pub roboflow_version: String,
    pub database_url: String,
    /// Transcript table name; validated as a plain SQL identifier because
    /// it is interpolated into statements.
    pub table_name: String,
    pub image_server_url: String,
    pub community_name: String,
    /// Directory artifacts are written to; created at startup.
    pub content_dir: PathBuf,
    /// Flag file checked once per pass; any non-zero integer stops the loop.
    pub stop_file: PathBuf,
    pub poll_interval: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let table_name = require_env("TABLE_NAME")?;
        validate_identifier(&table_name)?;

        Ok(Config {
            user_token: require_env("USER_TOKEN")?,
            group_token: require_env("GROUP_TOKEN")?,
            group_id: require_env("GROUP_ID")?
                .parse::<i64>()
                .context("GROUP_ID must be a signed integer (negative for a community)")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            llm_model: require_env("LLM_MODEL")?,
            roboflow_api_key: require_env("ROBOFLOW_API_KEY")?,
            roboflow_project_id: require_env("ROBOFLOW_PROJECT_ID")?,
            roboflow_version: require_env("ROBOFLOW_VERSION")?,
            database_url: require_env("DATABASE_URL")?,
            table_name,
            image_server_url: require_env("IMAGE_SERVER_URL")?,
            community_name: std::env::var("COMMUNITY_NAME")
                .unwrap_or_else(|_| "Аддикция".to_string()),
            content_dir: std::env::var("CONTENT_DIR")
                .unwrap_or_else(|_| "content".to_string())
                .into(),
            stop_file: std::env::var("STOP_FILE")
                .unwrap_or_else(|_| "stop_or_continue.txt".to_string())
                .into(),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse::<u64>()
                    .context("POLL_INTERVAL_SECS must be a non-negative integer")?,
            ),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// The transcript table name is interpolated into SQL text, so it must be a
/// plain identifier — configuration can never smuggle a statement in.
fn validate_identifier(name: &str) -> Result<()> {
    let head_ok = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let tail_ok = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !head_ok || !tail_ok {
        bail!("TABLE_NAME '{name}' is not a valid SQL identifier");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_accepts_plain_names() {
        assert!(validate_identifier("chat_history").is_ok());
        assert!(validate_identifier("_sessions2").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection() {
        assert!(validate_identifier("chat; DROP TABLE users").is_err());
        assert!(validate_identifier("chat history").is_err());
        assert!(validate_identifier("1chat").is_err());
        assert!(validate_identifier("").is_err());
    }
}

mod artifact;
mod compose;
mod config;
mod errors;
mod imagegen;
mod layout;
mod llm_client;
mod poll;
mod session;
mod state;
mod threads;
mod vision;
mod vk;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compose::Composer;
use crate::config::Config;
use crate::imagegen::RemoteImageServer;
use crate::llm_client::LlmClient;
use crate::poll::{PollLoop, StopFile};
use crate::session::store::PgSessionStore;
use crate::state::BotContext;
use crate::threads::ThreadReconstructor;
use crate::vision::RoboflowDetector;
use crate::vk::VkClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails before the loop on missing env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting adda-bot v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.content_dir)?;

    // Transcript store (PostgreSQL, append-only)
    let store = PgSessionStore::connect(&config.database_url, &config.table_name).await?;
    store.ensure_schema().await?;

    // External collaborators
    let vk = VkClient::new(
        config.user_token.clone(),
        config.group_token.clone(),
        config.group_id,
    );
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.llm_model.clone(),
        &config.community_name,
    );
    info!("LLM client initialized (model: {})", config.llm_model);

    let detector = RoboflowDetector::new(
        config.roboflow_api_key.clone(),
        config.roboflow_project_id.clone(),
        config.roboflow_version.clone(),
    );
    let imagegen = RemoteImageServer::new(config.image_server_url.clone());
    let composer = Composer::new(
        Arc::new(imagegen),
        Arc::new(detector),
        config.content_dir.clone(),
    );

    let ctx = BotContext {
        wall: Arc::new(vk),
        generator: Arc::new(llm),
        store: Arc::new(store),
        composer,
        reconstructor: ThreadReconstructor::new(config.group_id),
        stop: Arc::new(StopFile::new(config.stop_file.clone())),
        content_dir: config.content_dir.clone(),
        poll_interval: config.poll_interval,
    };

    PollLoop::new(ctx).run().await?;

    info!("adda-bot stopped cleanly");
    Ok(())
}

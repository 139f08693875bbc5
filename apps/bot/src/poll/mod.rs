//! Poll loop — the single orchestrating worker.
//!
//! Cycle: stop check → fetch the latest post's comment snapshot →
//! reconstruct every top-level thread → answer ready threads in snapshot
//! order → sleep the poll interval. Threads are handled sequentially; a
//! failed thread is logged and abandoned for the pass (its turn parity is
//! unchanged, so it is retried next pass), and a failed pass only skips to
//! the next cycle. The loop itself never crashes on per-pass errors.
//!
//! The stop signal is polled once per full pass; an in-flight thread always
//! completes or fails before the signal is honored. On stop the loop
//! drains: transcript table wiped, leftover artifacts removed, clean
//! return.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::artifact;
use crate::errors::BotError;
use crate::session::ConversationSession;
use crate::state::BotContext;
use crate::threads::Turn;

/// External stop flag, checked once per full pass.
#[async_trait]
pub trait StopSignal: Send + Sync {
    async fn should_stop(&self) -> bool;
}

/// File-based stop flag: any non-zero integer in the file stops the loop.
/// A missing, empty, or unparseable file means "keep running".
pub struct StopFile {
    path: PathBuf,
}

impl StopFile {
    pub fn new(path: PathBuf) -> Self {
        StopFile { path }
    }
}

#[async_trait]
impl StopSignal for StopFile {
    async fn should_stop(&self) -> bool {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content.trim().parse::<i64>().map(|v| v != 0).unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Outcome of one ready thread within a pass: the attachment reference on
/// success, the error description on failure.
#[derive(Debug)]
pub struct ThreadOutcome {
    pub comment_id: i64,
    pub result: Result<String, String>,
}

/// Structured record of one full pass.
#[derive(Debug)]
pub struct PassReport {
    pub post_id: i64,
    pub outcomes: Vec<ThreadOutcome>,
}

impl PassReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

pub struct PollLoop {
    ctx: BotContext,
}

impl PollLoop {
    pub fn new(ctx: BotContext) -> Self {
        PollLoop { ctx }
    }

    /// Runs until the stop signal fires, then drains and returns.
    pub async fn run(&self) -> Result<(), BotError> {
        info!("Poll loop started (interval {:?})", self.ctx.poll_interval);
        loop {
            if self.ctx.stop.should_stop().await {
                self.drain().await?;
                return Ok(());
            }

            match self.run_pass().await {
                Ok(report) => {
                    if !report.outcomes.is_empty() {
                        info!(
                            post = report.post_id,
                            answered = report.outcomes.len() - report.failures(),
                            failed = report.failures(),
                            "Pass complete"
                        );
                    }
                    for outcome in report.outcomes.iter().filter(|o| o.result.is_err()) {
                        debug!(comment = outcome.comment_id, "Thread will be retried next pass");
                    }
                }
                Err(e) => warn!("Pass failed: {e}"),
            }

            tokio::time::sleep(self.ctx.poll_interval).await;
        }
    }

    /// One full pass over the latest post's comment snapshot.
    async fn run_pass(&self) -> Result<PassReport, BotError> {
        let post_id = self.ctx.wall.latest_post_id().await?;
        let comments = self.ctx.wall.fetch_comments(post_id).await?;

        let mut outcomes = Vec::new();
        for comment in &comments {
            let state = self.ctx.reconstructor.reconstruct(comment);
            if !state.ready {
                continue;
            }
            let result = self.answer_thread(post_id, comment.id, &state.turns).await;
            match &result {
                Ok(attachment) => {
                    info!(comment = comment.id, attachment = %attachment, "Thread answered")
                }
                // Parity is unchanged, so the thread is retried next pass.
                Err(e) => warn!(comment = comment.id, "Thread failed: {e}"),
            }
            outcomes.push(ThreadOutcome {
                comment_id: comment.id,
                result: result.map_err(|e| e.to_string()),
            });
        }

        Ok(PassReport { post_id, outcomes })
    }

    /// Session → compose → publish for one ready thread. The artifact is
    /// discarded right after publishing; the handle's Drop covers every
    /// failure path in between.
    async fn answer_thread(
        &self,
        post_id: i64,
        comment_id: i64,
        turns: &[Turn],
    ) -> Result<String, BotError> {
        let session =
            ConversationSession::begin(self.ctx.store.clone(), self.ctx.generator.clone());
        let reply = session.generate_reply(turns).await?;
        let artifact = self
            .ctx
            .composer
            .compose(session.id(), &reply.comment, &reply.mood)
            .await?;
        let attachment = self
            .ctx
            .wall
            .publish_reply(post_id, comment_id, artifact.path())
            .await?;
        artifact.discard();
        Ok(attachment)
    }

    /// Terminal cleanup once the stop signal is observed.
    async fn drain(&self) -> Result<(), BotError> {
        let wiped = self.ctx.store.clear_all().await?;
        let removed = artifact::clear_content_dir(&self.ctx.content_dir)?;
        info!(
            transcript_rows = wiped,
            artifacts = removed,
            "Stop signal observed; drained and shutting down"
        );
        Ok(())
    }
}

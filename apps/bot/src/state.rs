use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::compose::Composer;
use crate::poll::StopSignal;
use crate::session::store::SessionStore;
use crate::session::ReplyGenerator;
use crate::threads::ThreadReconstructor;
use crate::vk::Wall;

/// Every external collaborator the poll loop needs, constructed once in
/// `main` and handed over explicitly — no ambient globals.
pub struct BotContext {
    pub wall: Arc<dyn Wall>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub store: Arc<dyn SessionStore>,
    pub composer: Composer,
    pub reconstructor: ThreadReconstructor,
    pub stop: Arc<dyn StopSignal>,
    /// Artifact directory, swept at drain time.
    pub content_dir: PathBuf,
    pub poll_interval: Duration,
}

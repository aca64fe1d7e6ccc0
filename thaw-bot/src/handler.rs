use std::sync::Arc;

use serenity::all::{Context, EventHandler, GuildId, Ready};
use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use thaw_core::RevocationConfig;
use thaw_database::Database;
use thaw_revocation::{
    RevocationRegistry, RevocationScheduler, SchedulerHandle, SerenityPlatform,
};

/// Gateway event handler; starts the revocation routine once the guild cache is filled.
pub struct Handler {
    db: Database,
    revocation: RevocationConfig,
    scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
}

impl Handler {
    pub fn new(
        db: Database,
        revocation: RevocationConfig,
        scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
    ) -> Self {
        Self {
            db,
            revocation,
            scheduler,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Thaw has awoken!"
        );
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        if !self.revocation.enabled {
            return;
        }

        // The cache is ready again after every reconnect; only start once.
        let mut slot = self.scheduler.lock().await;
        if slot.is_some() {
            return;
        }

        let registry = RevocationRegistry::standard();
        for strategy in registry.strategies() {
            info!(
                applies_to = %strategy.applies_to(),
                revoke_kind = %strategy.revoke_kind(),
                "registered revocable action"
            );
        }

        let platform = SerenityPlatform::new(
            Arc::clone(&ctx.http),
            Arc::clone(&ctx.cache),
            self.revocation.mute_role_name.clone(),
        );
        let scheduler = RevocationScheduler::new(
            Arc::new(self.db.clone()),
            Arc::new(platform),
            registry,
            self.revocation.interval,
        );

        info!(guilds = guilds.len(), "Guild cache ready, starting revocation routine.");
        *slot = Some(Arc::new(scheduler).start());
    }
}

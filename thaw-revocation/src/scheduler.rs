use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use thaw_database::model::actions::NewAction;
use thaw_utils::formatting::{format_compact_duration, format_user_label};
use thaw_utils::time::{now_unix_secs, secs_since};

use crate::decision::{ApprovedRevocation, decide};
use crate::history::ActionHistory;
use crate::platform::{GuildRef, Platform, PlatformError};
use crate::registry::RevocationRegistry;
use crate::strategy::{FailureClass, REVOCATION_REASON, RevocableAction};

/// How a dispatched revocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationOutcome {
    Revoked,
    /// Failed in a way the strategy expects, e.g. the user was already unbanned.
    KnownFailure,
    UnknownFailure,
}

/// Periodically lifts expired temporary moderation actions.
pub struct RevocationScheduler {
    history: Arc<dyn ActionHistory>,
    platform: Arc<dyn Platform>,
    registry: Arc<RevocationRegistry>,
    interval: Duration,
}

impl RevocationScheduler {
    pub fn new(
        history: Arc<dyn ActionHistory>,
        platform: Arc<dyn Platform>,
        registry: RevocationRegistry,
        interval: Duration,
    ) -> Self {
        Self {
            history,
            platform,
            registry: Arc::new(registry),
            interval,
        }
    }

    /// Run a sweep right away and then again `interval` after each sweep finishes.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let shutdown = CancellationToken::new();
        let loop_shutdown = shutdown.clone();

        let task = tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                "temporary action revocation routine started"
            );

            loop {
                // A sweep runs on its own task so that a panic ends the sweep only.
                let scheduler = Arc::clone(&self);
                let sweep = tokio::spawn(async move { scheduler.sweep(now_unix_secs()).await });

                match sweep.await {
                    Ok(Ok(dispatched)) => {
                        debug!(dispatched = dispatched.len(), "revocation sweep finished");
                    }
                    Ok(Err(source)) => error!(?source, "revocation sweep failed"),
                    Err(source) => error!(?source, "revocation sweep aborted"),
                }

                tokio::select! {
                    biased;
                    _ = loop_shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }

            info!("temporary action revocation routine stopped");
        });

        SchedulerHandle { shutdown, task }
    }

    /// Check expired actions once and dispatch the approved revocations.
    ///
    /// Returns the handles of the dispatched revocation tasks; dropping them
    /// lets the revocations finish in the background.
    pub async fn sweep(&self, now: u64) -> anyhow::Result<Vec<JoinHandle<RevocationOutcome>>> {
        debug!("Checking expired temporary moderation actions to revoke...");

        let expired = self
            .history
            .expired_actions_ascending(now)
            .await
            .context("failed to load expired temporary actions")?;
        let approved = decide(&expired, &self.registry, self.history.as_ref(), now).await;

        let dispatched: Vec<_> = approved
            .into_iter()
            .filter_map(|approval| self.dispatch(approval, now))
            .collect();

        debug!(
            expired = expired.len(),
            dispatched = dispatched.len(),
            "Finished checking expired temporary moderation actions to revoke."
        );
        Ok(dispatched)
    }

    fn dispatch(
        &self,
        approval: ApprovedRevocation,
        now: u64,
    ) -> Option<JoinHandle<RevocationOutcome>> {
        let key = approval.key;
        let revocation = self.registry.resolve(key.action_type)?;

        let Some(guild) = self.platform.resolve_guild(key.guild_id) else {
            info!(
                guild_id = key.guild_id,
                target_id = key.target_id,
                "Attempted to revoke a temporary moderation action but the bot is not connected to the guild anymore, skipping revoking."
            );
            return None;
        };

        let history = Arc::clone(&self.history);
        let platform = Arc::clone(&self.platform);
        Some(tokio::spawn(async move {
            execute_revocation(
                history.as_ref(),
                platform.as_ref(),
                revocation,
                guild,
                approval,
                now,
            )
            .await
        }))
    }
}

async fn execute_revocation(
    history: &dyn ActionHistory,
    platform: &dyn Platform,
    revocation: RevocableAction,
    guild: GuildRef,
    approval: ApprovedRevocation,
    now: u64,
) -> RevocationOutcome {
    let key = approval.key;

    let user = match platform.resolve_user(key.target_id).await {
        Ok(user) => user,
        Err(failure) => return handle_failure(revocation, &failure, &approval),
    };

    // Recorded before the platform call so that a lost response cannot lead to
    // a second attempt on the next sweep.
    let recorded = history
        .add_action(NewAction {
            guild_id: guild.id,
            author_id: platform.current_user_id(),
            target_id: user.id,
            action_type: revocation.revoke_kind(),
            expires_at: None,
            reason: REVOCATION_REASON.to_owned(),
        })
        .await;
    if let Err(source) = recorded {
        warn!(
            ?source,
            guild_id = key.guild_id,
            target_id = key.target_id,
            "failed to record revocation of temporary action; retrying next sweep"
        );
        return RevocationOutcome::UnknownFailure;
    }

    if let Err(failure) = revocation
        .revoke(platform, &guild, &user, REVOCATION_REASON)
        .await
    {
        return handle_failure(revocation, &failure, &approval);
    }

    let overdue = approval
        .candidate
        .expires_at
        .map_or(0, |expires_at| secs_since(expires_at, now));
    info!(
        action = %key.action_type,
        user = %format_user_label(&user.name, user.discriminator, user.id),
        guild = %guild.name,
        overdue = %format_compact_duration(overdue),
        "Revoked temporary moderation action."
    );
    RevocationOutcome::Revoked
}

fn handle_failure(
    revocation: RevocableAction,
    failure: &PlatformError,
    approval: &ApprovedRevocation,
) -> RevocationOutcome {
    let key = approval.key;
    match revocation.classify_failure(failure, key.target_id) {
        FailureClass::Known => RevocationOutcome::KnownFailure,
        FailureClass::Unknown => {
            warn!(
                error = %failure,
                guild_id = key.guild_id,
                target_id = key.target_id,
                action = %key.action_type,
                "Attempted to revoke a temporary moderation action but something unexpected went wrong."
            );
            RevocationOutcome::UnknownFailure
        }
    }
}

/// Control over a started [`RevocationScheduler`].
pub struct SchedulerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling sweeps and wait for the routine to exit.
    ///
    /// A sweep in progress is allowed to finish, and revocations it already
    /// dispatched keep running.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(source) = self.task.await {
            error!(?source, "revocation routine ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

use async_trait::async_trait;

use thaw_database::Database;
use thaw_database::impls::actions;
use thaw_database::model::actions::{ActionKind, ActionRecord, NewAction};

/// Read and append access to the moderation action history.
///
/// Implementations must make appends atomic; the scheduler appends from
/// revocation tasks while the next sweep may already be reading.
#[async_trait]
pub trait ActionHistory: Send + Sync {
    /// Temporary actions whose expiry is at or before `now`, oldest expiry first.
    async fn expired_actions_ascending(&self, now: u64) -> anyhow::Result<Vec<ActionRecord>>;

    /// The most recently issued action of `action_type` against a target.
    async fn find_last_action_against_target_by_type(
        &self,
        guild_id: u64,
        target_id: u64,
        action_type: ActionKind,
    ) -> anyhow::Result<Option<ActionRecord>>;

    /// Append an action and return it as persisted.
    async fn add_action(&self, new_action: NewAction) -> anyhow::Result<ActionRecord>;
}

#[async_trait]
impl ActionHistory for Database {
    async fn expired_actions_ascending(&self, now: u64) -> anyhow::Result<Vec<ActionRecord>> {
        actions::get_expired_actions_ascending(self, now).await
    }

    async fn find_last_action_against_target_by_type(
        &self,
        guild_id: u64,
        target_id: u64,
        action_type: ActionKind,
    ) -> anyhow::Result<Option<ActionRecord>> {
        actions::find_last_action_against_target_by_type(self, guild_id, target_id, action_type)
            .await
    }

    async fn add_action(&self, new_action: NewAction) -> anyhow::Result<ActionRecord> {
        actions::add_action(self, &new_action).await
    }
}

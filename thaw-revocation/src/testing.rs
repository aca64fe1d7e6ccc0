//! In-memory collaborators for exercising the routine without Discord or PostgreSQL.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;

use thaw_database::model::actions::{ActionKind, ActionRecord, NewAction};

use crate::history::ActionHistory;
use crate::platform::{GuildRef, Platform, PlatformError, UserRef};

pub const GUILD: u64 = 100;
pub const MODERATOR: u64 = 200;
pub const BOT: u64 = 999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryFailure {
    None,
    Error,
    Panic,
}

pub struct InMemoryHistory {
    records: Mutex<Vec<ActionRecord>>,
    clock: AtomicU64,
    expired_queries: AtomicUsize,
    expired_query_failure: Mutex<QueryFailure>,
    fail_appends: Mutex<bool>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            clock: AtomicU64::new(0),
            expired_queries: AtomicUsize::new(0),
            expired_query_failure: Mutex::new(QueryFailure::None),
            fail_appends: Mutex::new(false),
        }
    }

    /// Move the store clock used for `issued_at` of appended records.
    pub fn set_clock(&self, now: u64) {
        self.clock.store(now, Ordering::SeqCst);
    }

    /// Record an action as if a moderator issued it at `issued_at`.
    pub fn issue(
        &self,
        target_id: u64,
        action_type: ActionKind,
        issued_at: u64,
        expires_at: Option<u64>,
    ) -> ActionRecord {
        let mut records = self.records.lock().unwrap();
        let record = ActionRecord {
            id: records.len() as u64 + 1,
            guild_id: GUILD,
            author_id: MODERATOR,
            target_id,
            action_type,
            issued_at,
            expires_at,
            reason: "issued in test".to_owned(),
        };
        records.push(record.clone());
        record
    }

    pub fn records(&self) -> Vec<ActionRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records appended by someone other than the test moderator.
    pub fn automatic_records(&self) -> Vec<ActionRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.author_id != MODERATOR)
            .collect()
    }

    pub fn expired_queries(&self) -> usize {
        self.expired_queries.load(Ordering::SeqCst)
    }

    pub fn fail_expired_query(&self, failure: QueryFailure) {
        *self.expired_query_failure.lock().unwrap() = failure;
    }

    pub fn fail_appends(&self, fail: bool) {
        *self.fail_appends.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ActionHistory for InMemoryHistory {
    async fn expired_actions_ascending(&self, now: u64) -> anyhow::Result<Vec<ActionRecord>> {
        self.expired_queries.fetch_add(1, Ordering::SeqCst);
        let failure = *self.expired_query_failure.lock().unwrap();
        match failure {
            QueryFailure::None => {}
            QueryFailure::Error => anyhow::bail!("connection refused"),
            QueryFailure::Panic => panic!("history store exploded"),
        }

        let mut expired: Vec<ActionRecord> = self
            .records()
            .into_iter()
            .filter(|record| record.expires_at.is_some_and(|expires_at| expires_at <= now))
            .collect();
        expired.sort_by_key(|record| (record.expires_at, record.id));
        Ok(expired)
    }

    async fn find_last_action_against_target_by_type(
        &self,
        guild_id: u64,
        target_id: u64,
        action_type: ActionKind,
    ) -> anyhow::Result<Option<ActionRecord>> {
        Ok(self
            .records()
            .into_iter()
            .filter(|record| {
                record.guild_id == guild_id
                    && record.target_id == target_id
                    && record.action_type == action_type
            })
            .max_by_key(ActionRecord::issue_order))
    }

    async fn add_action(&self, new_action: NewAction) -> anyhow::Result<ActionRecord> {
        if *self.fail_appends.lock().unwrap() {
            anyhow::bail!("disk full");
        }

        let mut records = self.records.lock().unwrap();
        let record = ActionRecord {
            id: records.len() as u64 + 1,
            guild_id: new_action.guild_id,
            author_id: new_action.author_id,
            target_id: new_action.target_id,
            action_type: new_action.action_type,
            issued_at: self.clock.load(Ordering::SeqCst),
            expires_at: new_action.expires_at,
            reason: new_action.reason,
        };
        records.push(record.clone());
        Ok(record)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    Unban { guild_id: u64, user_id: u64, reason: String },
    RemoveMute { guild_id: u64, user_id: u64, reason: String },
}

pub struct FakePlatform {
    guilds: Mutex<HashSet<u64>>,
    missing_users: Mutex<HashSet<u64>>,
    revoke_failure: Mutex<Option<PlatformError>>,
    calls: Mutex<Vec<PlatformCall>>,
}

impl FakePlatform {
    /// A platform connected to [`GUILD`] where every user exists.
    pub fn new() -> Self {
        Self {
            guilds: Mutex::new(HashSet::from([GUILD])),
            missing_users: Mutex::new(HashSet::new()),
            revoke_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn leave_guild(&self, guild_id: u64) {
        self.guilds.lock().unwrap().remove(&guild_id);
    }

    pub fn delete_user(&self, user_id: u64) {
        self.missing_users.lock().unwrap().insert(user_id);
    }

    pub fn fail_revocations_with(&self, failure: PlatformError) {
        *self.revoke_failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    fn finish(&self, call: PlatformCall) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call);
        match self.revoke_failure.lock().unwrap().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn resolve_guild(&self, guild_id: u64) -> Option<GuildRef> {
        self.guilds
            .lock()
            .unwrap()
            .contains(&guild_id)
            .then(|| GuildRef {
                id: guild_id,
                name: format!("guild {guild_id}"),
            })
    }

    async fn resolve_user(&self, user_id: u64) -> Result<UserRef, PlatformError> {
        if self.missing_users.lock().unwrap().contains(&user_id) {
            return Err(PlatformError::Http {
                status: 404,
                code: thaw_utils::discord::UNKNOWN_USER,
                message: "Unknown User".to_owned(),
            });
        }

        Ok(UserRef {
            id: user_id,
            name: format!("user{user_id}"),
            discriminator: None,
        })
    }

    fn current_user_id(&self) -> u64 {
        BOT
    }

    async fn unban(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.finish(PlatformCall::Unban {
            guild_id: guild.id,
            user_id: user.id,
            reason: reason.to_owned(),
        })
    }

    async fn remove_mute(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.finish(PlatformCall::RemoveMute {
            guild_id: guild.id,
            user_id: user.id,
            reason: reason.to_owned(),
        })
    }
}

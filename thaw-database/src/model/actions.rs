use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every kind of moderation action the bot records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Ban,
    Unban,
    Kick,
    Warn,
    Mute,
    Unmute,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Ban,
        ActionKind::Unban,
        ActionKind::Kick,
        ActionKind::Warn,
        ActionKind::Mute,
        ActionKind::Unmute,
    ];

    /// Storage key, also used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Ban => "ban",
            ActionKind::Unban => "unban",
            ActionKind::Kick => "kick",
            ActionKind::Warn => "warn",
            ActionKind::Mute => "mute",
            ActionKind::Unmute => "unmute",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| anyhow::anyhow!("unknown moderation action type `{raw}`"))
    }
}

/// One persisted moderation event. Records are append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: u64,
    pub guild_id: u64,
    pub author_id: u64,
    pub target_id: u64,
    pub action_type: ActionKind,
    pub issued_at: u64,
    /// `None` for permanent actions and for revocations.
    pub expires_at: Option<u64>,
    pub reason: String,
}

impl ActionRecord {
    /// Position of this record in the history of its target.
    ///
    /// `issued_at` only has second resolution, so ties fall back to the
    /// store-assigned id, which grows with every insert.
    pub fn issue_order(&self) -> (u64, u64) {
        (self.issued_at, self.id)
    }

    /// Whether this record was issued strictly after `other`.
    pub fn issued_after(&self, other: &ActionRecord) -> bool {
        self.issue_order().cmp(&other.issue_order()) == Ordering::Greater
    }

    /// Whether the record still restricts at `now`. Records without expiry always do.
    pub fn is_active_at(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Input for appending an action to the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAction {
    pub guild_id: u64,
    pub author_id: u64,
    pub target_id: u64,
    pub action_type: ActionKind,
    pub expires_at: Option<u64>,
    pub reason: String,
}

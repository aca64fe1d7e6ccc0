//! Arbitration of expired temporary actions against the rest of the history.
//!
//! Expired records are grouped per guild, target and action kind. Only the
//! most recently issued record of a group is considered, and it is lifted
//! only if nothing issued after it already settled the restriction: a
//! permanent re-application, a newer temporary one that is still running, or
//! a revocation.

use std::collections::BTreeMap;

use anyhow::Context as _;
use tracing::{debug, warn};

use thaw_database::model::actions::{ActionKind, ActionRecord};

use crate::history::ActionHistory;
use crate::registry::RevocationRegistry;
use crate::strategy::RevocableAction;

/// The unit of arbitration: expired records sharing a key are decided together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevocationGroupKey {
    pub guild_id: u64,
    pub target_id: u64,
    pub action_type: ActionKind,
}

impl RevocationGroupKey {
    pub fn of(record: &ActionRecord) -> Self {
        Self {
            guild_id: record.guild_id,
            target_id: record.target_id,
            action_type: record.action_type,
        }
    }
}

/// A group the engine approved for revocation, with the record that decided it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovedRevocation {
    pub key: RevocationGroupKey,
    pub candidate: ActionRecord,
}

/// Outcome of arbitrating a single group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Revoke,
    /// The latest action of the same kind is permanent.
    OverriddenByPermanent,
    /// A newer temporary action of the same kind has not expired yet.
    SupersededByNewerTemporary,
    /// The restriction was lifted after the candidate was issued.
    AlreadyRevoked,
}

/// Decide which groups of `expired` should be revoked now.
///
/// Reads `history` but never writes to it. Groups are returned in ascending
/// key order. A group whose arbitration fails is logged and left out; the
/// remaining groups are still decided.
pub async fn decide(
    expired: &[ActionRecord],
    registry: &RevocationRegistry,
    history: &dyn ActionHistory,
    now: u64,
) -> Vec<ApprovedRevocation> {
    let mut approved = Vec::new();

    for (key, group) in group_expired(expired, registry) {
        let Some(revocation) = registry.resolve(key.action_type) else {
            continue;
        };
        let Some(candidate) = select_candidate(&group) else {
            continue;
        };

        match arbitrate(key, candidate, revocation, history, now).await {
            Ok(Verdict::Revoke) => approved.push(ApprovedRevocation {
                key,
                candidate: candidate.clone(),
            }),
            Ok(verdict) => debug!(
                guild_id = key.guild_id,
                target_id = key.target_id,
                action = %key.action_type,
                ?verdict,
                "expired temporary action is not revoked"
            ),
            Err(source) => warn!(
                ?source,
                guild_id = key.guild_id,
                target_id = key.target_id,
                action = %key.action_type,
                "failed to arbitrate expired temporary action; retrying next sweep"
            ),
        }
    }

    approved
}

/// Drop non-revocable kinds and group the rest by [`RevocationGroupKey`].
pub fn group_expired<'a>(
    expired: &'a [ActionRecord],
    registry: &RevocationRegistry,
) -> BTreeMap<RevocationGroupKey, Vec<&'a ActionRecord>> {
    let mut groups: BTreeMap<RevocationGroupKey, Vec<&ActionRecord>> = BTreeMap::new();
    for record in expired
        .iter()
        .filter(|record| registry.is_revocable(record.action_type))
    {
        groups
            .entry(RevocationGroupKey::of(record))
            .or_default()
            .push(record);
    }
    groups
}

/// The last issued record of a group; ties on `issued_at` go to the higher id.
pub fn select_candidate<'a>(group: &[&'a ActionRecord]) -> Option<&'a ActionRecord> {
    group
        .iter()
        .copied()
        .max_by_key(|record| record.issue_order())
}

/// Arbitrate one group given its candidate record.
pub async fn arbitrate(
    key: RevocationGroupKey,
    candidate: &ActionRecord,
    revocation: RevocableAction,
    history: &dyn ActionHistory,
    now: u64,
) -> anyhow::Result<Verdict> {
    let last_action = history
        .find_last_action_against_target_by_type(key.guild_id, key.target_id, key.action_type)
        .await?
        .with_context(|| {
            format!(
                "expired {} action {} is missing from the history of target {}",
                key.action_type, candidate.id, key.target_id
            )
        })?;

    // For example a user perm-banned after being temp-banned.
    if last_action.expires_at.is_none() {
        return Ok(Verdict::OverriddenByPermanent);
    }

    if last_action.issued_after(candidate) && last_action.is_active_at(now) {
        return Ok(Verdict::SupersededByNewerTemporary);
    }

    // Covers manual unbans as well as revocations this routine already did.
    let last_revocation = history
        .find_last_action_against_target_by_type(
            key.guild_id,
            key.target_id,
            revocation.revoke_kind(),
        )
        .await?;
    if last_revocation.is_some_and(|last_revocation| {
        last_revocation.issued_after(candidate) && last_revocation.is_active_at(now)
    }) {
        return Ok(Verdict::AlreadyRevoked);
    }

    Ok(Verdict::Revoke)
}

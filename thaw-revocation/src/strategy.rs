use tracing::info;

use thaw_database::model::actions::ActionKind;
use thaw_utils::discord::{UNKNOWN_BAN, UNKNOWN_MEMBER, UNKNOWN_USER};

use crate::platform::{GuildRef, Platform, PlatformError, UserRef};

/// Audit log and history reason used for every automatic revocation.
pub const REVOCATION_REASON: &str = "Automatic revocation of temporary action.";

/// Whether a revocation failure was an anticipated outcome for its action kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    Known,
    Unknown,
}

/// A moderation action that can be issued temporarily and lifted again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevocableAction {
    TemporaryBan,
    TemporaryMute,
}

impl RevocableAction {
    pub const ALL: [RevocableAction; 2] =
        [RevocableAction::TemporaryBan, RevocableAction::TemporaryMute];

    /// The action kind this strategy lifts.
    pub fn applies_to(self) -> ActionKind {
        match self {
            RevocableAction::TemporaryBan => ActionKind::Ban,
            RevocableAction::TemporaryMute => ActionKind::Mute,
        }
    }

    /// The action kind recorded when the restriction is lifted.
    pub fn revoke_kind(self) -> ActionKind {
        match self {
            RevocableAction::TemporaryBan => ActionKind::Unban,
            RevocableAction::TemporaryMute => ActionKind::Unmute,
        }
    }

    /// Lift the restriction from `user` in `guild`.
    pub async fn revoke(
        self,
        platform: &dyn Platform,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError> {
        match self {
            RevocableAction::TemporaryBan => platform.unban(guild, user, reason).await,
            RevocableAction::TemporaryMute => platform.remove_mute(guild, user, reason).await,
        }
    }

    /// Decide whether `failure` is an expected outcome of revoking against `target_id`.
    ///
    /// Known failures are logged here; unknown ones are left to the caller.
    pub fn classify_failure(self, failure: &PlatformError, target_id: u64) -> FailureClass {
        let Some(code) = failure.discord_code() else {
            return FailureClass::Unknown;
        };

        match (self, code) {
            (_, UNKNOWN_USER) => {
                info!(
                    target_id,
                    action = %self.applies_to(),
                    "Attempted to revoke a temporary moderation action but the user does not exist anymore."
                );
                FailureClass::Known
            }
            (RevocableAction::TemporaryBan, UNKNOWN_BAN) => {
                info!(
                    target_id,
                    "Attempted to revoke a temporary ban but the user is not banned anymore."
                );
                FailureClass::Known
            }
            (RevocableAction::TemporaryMute, UNKNOWN_MEMBER) => {
                info!(
                    target_id,
                    "Attempted to revoke a temporary mute but the user is not a member of the guild anymore."
                );
                FailureClass::Known
            }
            _ => FailureClass::Unknown,
        }
    }
}

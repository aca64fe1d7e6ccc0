use async_trait::async_trait;
use thiserror::Error;

/// A guild the bot is currently a member of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
}

/// A resolved Discord user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
    /// Legacy `#1234` discriminator, absent for migrated usernames.
    pub discriminator: Option<u16>,
}

/// Failure of a chat platform call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// Discord answered with an error status.
    #[error("discord rejected the request with status {status} (code {code}): {message}")]
    Http {
        status: u16,
        code: isize,
        message: String,
    },

    #[error("guild {guild_id} has no role named `{role_name}`")]
    MuteRoleMissing { guild_id: u64, role_name: String },

    #[error("invalid discord id {0}")]
    InvalidId(u64),

    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Discord JSON error code, if the failure came from a Discord response.
    pub fn discord_code(&self) -> Option<isize> {
        match self {
            PlatformError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// The slice of the chat platform the revocation routine talks to.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Look up a guild the bot is connected to. `None` if it left the guild.
    fn resolve_guild(&self, guild_id: u64) -> Option<GuildRef>;

    /// Fetch a user by id; this usually goes over the network.
    async fn resolve_user(&self, user_id: u64) -> Result<UserRef, PlatformError>;

    /// Id of the bot account, recorded as the author of automatic revocations.
    fn current_user_id(&self) -> u64;

    async fn unban(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError>;

    async fn remove_mute(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError>;
}

use std::num::NonZeroU16;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{Cache, GuildId, Http, RoleId, UserId};
use tracing::debug;

use thaw_utils::discord::{http_failure, is_missing_permissions};

use crate::platform::{GuildRef, Platform, PlatformError, UserRef};

/// [`Platform`] backed by a running serenity client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    mute_role_name: String,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, mute_role_name: impl Into<String>) -> Self {
        Self {
            http,
            cache,
            mute_role_name: mute_role_name.into(),
        }
    }

    fn mute_role(&self, guild_id: GuildId) -> Result<RoleId, PlatformError> {
        let role = self.cache.guild(guild_id).and_then(|guild| {
            guild
                .roles
                .values()
                .find(|role| role.name.eq_ignore_ascii_case(&self.mute_role_name))
                .map(|role| role.id)
        });

        role.ok_or_else(|| PlatformError::MuteRoleMissing {
            guild_id: guild_id.get(),
            role_name: self.mute_role_name.clone(),
        })
    }
}

impl From<serenity::Error> for PlatformError {
    fn from(source: serenity::Error) -> Self {
        match http_failure(&source) {
            Some(failure) => {
                if is_missing_permissions(&failure) {
                    debug!(code = failure.code, "discord denied the request for lack of permissions");
                }
                PlatformError::Http {
                    status: failure.status,
                    code: failure.code,
                    message: failure.message,
                }
            }
            None => PlatformError::Other(source.to_string()),
        }
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    fn resolve_guild(&self, guild_id: u64) -> Option<GuildRef> {
        let guild = self.cache.guild(to_guild_id(guild_id).ok()?)?;
        Some(GuildRef {
            id: guild_id,
            name: guild.name.clone(),
        })
    }

    async fn resolve_user(&self, user_id: u64) -> Result<UserRef, PlatformError> {
        let user = self.http.get_user(to_user_id(user_id)?).await?;
        Ok(UserRef {
            id: user.id.get(),
            name: user.name,
            discriminator: user.discriminator.map(NonZeroU16::get),
        })
    }

    fn current_user_id(&self) -> u64 {
        self.cache.current_user().id.get()
    }

    async fn unban(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.http
            .remove_ban(to_guild_id(guild.id)?, to_user_id(user.id)?, Some(reason))
            .await?;
        Ok(())
    }

    async fn remove_mute(
        &self,
        guild: &GuildRef,
        user: &UserRef,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let guild_id = to_guild_id(guild.id)?;
        let role_id = self.mute_role(guild_id)?;
        self.http
            .remove_member_role(guild_id, to_user_id(user.id)?, role_id, Some(reason))
            .await?;
        Ok(())
    }
}

// Serenity ids panic on zero, which a corrupted history row could contain.
fn to_guild_id(id: u64) -> Result<GuildId, PlatformError> {
    if id == 0 {
        return Err(PlatformError::InvalidId(id));
    }
    Ok(GuildId::new(id))
}

fn to_user_id(id: u64) -> Result<UserId, PlatformError> {
    if id == 0 {
        return Err(PlatformError::InvalidId(id));
    }
    Ok(UserId::new(id))
}

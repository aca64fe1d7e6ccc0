use std::env;
use std::time::Duration;

use anyhow::Context as _;

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REVOCATION_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MUTE_ROLE_NAME: &str = "Muted";

/// Process configuration, read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub auto_run_migrations: bool,
    pub revocation: RevocationConfig,
}

/// Settings for the temporary action revocation routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevocationConfig {
    pub enabled: bool,
    /// Delay between the end of one sweep and the start of the next.
    pub interval: Duration,
    /// Name of the guild role that marks a member as muted.
    pub mute_role_name: String,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_REVOCATION_INTERVAL,
            mute_role_name: DEFAULT_MUTE_ROLE_NAME.to_owned(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let discord_token = required(&lookup, "DISCORD_TOKEN")?;
        let database_url = required(&lookup, "DATABASE_URL")?;

        let database_max_connections = u32::try_from(parse_u64(
            lookup("DATABASE_MAX_CONNECTIONS").as_deref(),
            u64::from(DEFAULT_DATABASE_MAX_CONNECTIONS),
        ))
        .context("DATABASE_MAX_CONNECTIONS out of u32 range")?;

        // A zero interval would turn the routine into a busy loop.
        let interval_secs = parse_u64(
            lookup("REVOCATION_INTERVAL_SECONDS").as_deref(),
            DEFAULT_REVOCATION_INTERVAL.as_secs(),
        )
        .max(1);

        let mute_role_name = lookup("MUTE_ROLE_NAME")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MUTE_ROLE_NAME.to_owned());

        Ok(Self {
            discord_token,
            database_url,
            database_max_connections,
            auto_run_migrations: parse_bool(lookup("AUTO_RUN_MIGRATIONS").as_deref(), true),
            revocation: RevocationConfig {
                enabled: parse_bool(lookup("REVOCATION_ENABLED").as_deref(), true),
                interval: Duration::from_secs(interval_secs),
                mute_role_name,
            },
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("missing required environment variable `{key}`"))
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn parse_u64(value: Option<&str>, default: u64) -> u64 {
    match value {
        Some(value) => value.trim().parse::<u64>().unwrap_or(default),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{Config, DEFAULT_MUTE_ROLE_NAME, RevocationConfig};

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = config_from(&[("DISCORD_TOKEN", "token"), ("DATABASE_URL", "postgres://")])
            .unwrap();

        assert_eq!(config.database_max_connections, 5);
        assert!(config.auto_run_migrations);
        assert_eq!(config.revocation, RevocationConfig::default());
        assert_eq!(config.revocation.interval, Duration::from_secs(300));
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(config_from(&[("DATABASE_URL", "postgres://")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "  "), ("DATABASE_URL", "postgres://")]).is_err());
    }

    #[test]
    fn revocation_settings_are_parsed() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("DATABASE_URL", "postgres://"),
            ("REVOCATION_ENABLED", "off"),
            ("REVOCATION_INTERVAL_SECONDS", "0"),
            ("MUTE_ROLE_NAME", "  "),
            ("AUTO_RUN_MIGRATIONS", "no"),
        ])
        .unwrap();

        assert!(!config.revocation.enabled);
        assert_eq!(config.revocation.interval, Duration::from_secs(1));
        assert_eq!(config.revocation.mute_role_name, DEFAULT_MUTE_ROLE_NAME);
        assert!(!config.auto_run_migrations);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("DATABASE_URL", "postgres://"),
            ("REVOCATION_INTERVAL_SECONDS", "soon"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert_eq!(config.revocation.interval, Duration::from_secs(300));
        assert_eq!(config.database_max_connections, 12);
    }
}

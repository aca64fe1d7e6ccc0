use anyhow::Context as _;
use tracing::debug;

use crate::{
    database::Database,
    model::actions::{ActionKind, ActionRecord, NewAction},
};

const ACTION_COLUMNS: &str =
    "id, guild_id, author_id, target_id, action_type, issued_at, expires_at, reason";

#[derive(sqlx::FromRow)]
struct ActionRow {
    id: i64,
    guild_id: i64,
    author_id: i64,
    target_id: i64,
    action_type: String,
    issued_at: i64,
    expires_at: Option<i64>,
    reason: String,
}

/// Append an action to the history and return the persisted record.
///
/// `issued_at` is taken from the database clock so that concurrent writers
/// share one notion of time.
pub async fn add_action(db: &Database, new_action: &NewAction) -> anyhow::Result<ActionRecord> {
    let guild_id_i64 = i64::try_from(new_action.guild_id).context("guild_id out of i64 range")?;
    let author_id_i64 =
        i64::try_from(new_action.author_id).context("author_id out of i64 range")?;
    let target_id_i64 =
        i64::try_from(new_action.target_id).context("target_id out of i64 range")?;
    let expires_at_i64 = new_action
        .expires_at
        .map(i64::try_from)
        .transpose()
        .context("expires_at out of i64 range")?;

    let row: ActionRow = sqlx::query_as(&format!(
        "INSERT INTO moderation_actions (
            guild_id,
            author_id,
            target_id,
            action_type,
            issued_at,
            expires_at,
            reason
         ) VALUES ($1, $2, $3, $4, FLOOR(EXTRACT(EPOCH FROM clock_timestamp()))::BIGINT, $5, $6)
         RETURNING {ACTION_COLUMNS}"
    ))
    .bind(guild_id_i64)
    .bind(author_id_i64)
    .bind(target_id_i64)
    .bind(new_action.action_type.as_str())
    .bind(expires_at_i64)
    .bind(new_action.reason.as_str())
    .fetch_one(db.pool())
    .await?;

    let record = to_action_record(row)?;
    debug!(
        id = record.id,
        guild_id = record.guild_id,
        target_id = record.target_id,
        action_type = %record.action_type,
        "moderation action recorded"
    );
    Ok(record)
}

/// Return every temporary action whose expiry is at or before `now`, oldest expiry first.
pub async fn get_expired_actions_ascending(
    db: &Database,
    now: u64,
) -> anyhow::Result<Vec<ActionRecord>> {
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;

    let rows: Vec<ActionRow> = sqlx::query_as(&format!(
        "SELECT {ACTION_COLUMNS}
         FROM moderation_actions
         WHERE expires_at IS NOT NULL AND expires_at <= $1
         ORDER BY expires_at ASC, id ASC"
    ))
    .bind(now_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(to_action_record).collect()
}

/// Return the most recently issued action of `action_type` against a target, if any.
pub async fn find_last_action_against_target_by_type(
    db: &Database,
    guild_id: u64,
    target_id: u64,
    action_type: ActionKind,
) -> anyhow::Result<Option<ActionRecord>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let target_id_i64 = i64::try_from(target_id).context("target_id out of i64 range")?;

    let row: Option<ActionRow> = sqlx::query_as(&format!(
        "SELECT {ACTION_COLUMNS}
         FROM moderation_actions
         WHERE guild_id = $1 AND target_id = $2 AND action_type = $3
         ORDER BY issued_at DESC, id DESC
         LIMIT 1"
    ))
    .bind(guild_id_i64)
    .bind(target_id_i64)
    .bind(action_type.as_str())
    .fetch_optional(db.pool())
    .await?;

    row.map(to_action_record).transpose()
}

fn to_action_record(row: ActionRow) -> anyhow::Result<ActionRecord> {
    Ok(ActionRecord {
        id: u64::try_from(row.id).context("id row out of u64 range")?,
        guild_id: u64::try_from(row.guild_id).context("guild_id row out of u64 range")?,
        author_id: u64::try_from(row.author_id).context("author_id row out of u64 range")?,
        target_id: u64::try_from(row.target_id).context("target_id row out of u64 range")?,
        action_type: row
            .action_type
            .parse()
            .with_context(|| format!("action row {} has an unreadable type", row.id))?,
        issued_at: u64::try_from(row.issued_at).context("issued_at row out of u64 range")?,
        expires_at: row
            .expires_at
            .map(u64::try_from)
            .transpose()
            .context("expires_at row out of u64 range")?,
        reason: row.reason,
    })
}

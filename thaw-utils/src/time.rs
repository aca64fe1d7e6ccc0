use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Seconds elapsed between `since` and `now`, zero if `since` lies in the future.
pub fn secs_since(since: u64, now: u64) -> u64 {
    now.saturating_sub(since)
}

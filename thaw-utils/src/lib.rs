/// Discord HTTP error inspection helpers.
pub mod discord;
/// Shared formatting helpers (durations, user labels).
pub mod formatting;
/// Shared time helpers.
pub mod time;

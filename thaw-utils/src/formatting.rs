/// Format seconds into a compact human-readable duration (e.g. 59s, 1m, 1h 5s, 1d 1h).
pub fn format_compact_duration(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = if days > 0 {
        // Days only carry hours.
        [(days, 'd'), (hours, 'h')]
            .into_iter()
            .filter(|(value, unit)| *value > 0 || *unit == 'd')
            .map(|(value, unit)| format!("{value}{unit}"))
            .collect()
    } else {
        [(hours, 'h'), (minutes, 'm'), (seconds, 's')]
            .into_iter()
            .filter(|(value, _)| *value > 0)
            .map(|(value, unit)| format!("{value}{unit}"))
            .collect()
    };

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Render a user for log lines, e.g. `name (123)` or `name#0420 (123)`.
pub fn format_user_label(name: &str, discriminator: Option<u16>, user_id: u64) -> String {
    match discriminator {
        Some(discriminator) => format!("{name}#{discriminator:04} ({user_id})"),
        None => format!("{name} ({user_id})"),
    }
}

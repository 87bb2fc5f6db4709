const SECS_PER_DAY: u64 = 86_400;

/// Current Unix time in whole seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Start of the week containing `secs`: Sunday 00:00 UTC, as Unix seconds.
pub fn week_start(secs: u64) -> u64 {
    let days = secs / SECS_PER_DAY;
    // 1970-01-01 was a Thursday (weekday 4 counting from Sunday).
    let weekday = (days + 4) % 7;
    days.saturating_sub(weekday) * SECS_PER_DAY
}

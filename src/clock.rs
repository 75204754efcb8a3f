use time::OffsetDateTime;

/// Milliseconds since the unix epoch. All staleness math compares these
/// against a millisecond threshold.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Wall-clock `HH:MM:SS`, stamped onto messages at write time.
pub fn wall_time() -> String {
    let fmt = time::macros::format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "00:00:00".to_owned())
}

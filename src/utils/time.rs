use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds, truncated to 32 bits as RTMP
/// handshake timestamps are.
pub fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u32
}

/// Signed millisecond difference `later - earlier`.
pub fn duration_delta_ms(earlier: Duration, later: Duration) -> i64 {
    later.as_millis() as i64 - earlier.as_millis() as i64
}

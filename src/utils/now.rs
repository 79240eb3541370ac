use chrono::Utc;

/// Returns the current timestamp in microseconds since the UNIX epoch.
///
/// Falls back to `0` if the clock is before the epoch.
///
/// ```rust
/// use wirebolt::utils::now;
/// let timestamp = now();
/// assert!(timestamp > 0);
/// ```
pub fn now() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}

/// Returns the current timestamp in milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

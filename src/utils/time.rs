use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Server-side deadline of an attempt.
pub fn deadline(started_at: DateTime<Utc>, duration_minutes: i32) -> DateTime<Utc> {
    started_at + Duration::minutes(duration_minutes as i64)
}

/// Seconds left on the clock, clamped at zero once the deadline has passed.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> i64 {
    (deadline(started_at, duration_minutes) - now).num_seconds().max(0)
}

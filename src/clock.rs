//! Wall-clock timestamps that never run backwards within the process.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Current Unix time in milliseconds.
///
/// If the system clock steps backwards, the last observed value is returned
/// instead, so successive calls are non-decreasing.
#[must_use]
pub fn now_millis() -> i64 {
    let wall = Utc::now().timestamp_millis();
    let prev = LAST_MILLIS.fetch_max(wall, Ordering::AcqRel);
    wall.max(prev)
}

/// Current time as a `DateTime`, derived from [`now_millis`].
#[must_use]
pub fn now() -> DateTime<Utc> {
    from_millis(now_millis())
}

/// Convert Unix milliseconds to a `DateTime`, clamping out-of-range values to the epoch.
#[must_use]
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

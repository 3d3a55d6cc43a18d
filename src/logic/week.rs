//! Weekly configuration selection.

use chrono::{DateTime, Duration, Utc};

/// Index into a per-week array for `now`.
///
/// `floor((now - first_due_date) / 7 days) + 1`, clamped to `[0, len - 1]`, so index 0 is
/// everything before the first due date. `None` when the array is empty.
pub fn current_week(now: DateTime<Utc>, first_due_date: DateTime<Utc>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let elapsed = now.signed_duration_since(first_due_date);
    let week = elapsed.num_seconds().div_euclid(Duration::weeks(1).num_seconds()) + 1;
    Some(week.clamp(0, len as i64 - 1) as usize)
}

/// Week number as shown to players (unclamped, 0 before the first due date).
pub fn week_number(now: DateTime<Utc>, first_due_date: DateTime<Utc>) -> i64 {
    let elapsed = now.signed_duration_since(first_due_date);
    (elapsed.num_seconds().div_euclid(Duration::weeks(1).num_seconds()) + 1).max(0)
}

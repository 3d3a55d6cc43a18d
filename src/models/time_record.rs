//! OffsetKey, TimeRecord, and the scheduler's result shapes.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hours in a day; match times are circular over this.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Sorted, deduplicated set of UTC offsets taking part in a match.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "Vec<i32>", into = "Vec<i32>")]
pub struct OffsetKey(Vec<i32>);

impl OffsetKey {
    pub fn new(offsets: impl IntoIterator<Item = i32>) -> Self {
        let mut v: Vec<i32> = offsets.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn offsets(&self) -> &[i32] {
        &self.0
    }

    /// Number of distinct offsets.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i32>> for OffsetKey {
    fn from(v: Vec<i32>) -> Self {
        Self::new(v)
    }
}

impl From<OffsetKey> for Vec<i32> {
    fn from(k: OffsetKey) -> Self {
        k.0
    }
}

/// `UTC-5,UTC+0,UTC+3`
impl fmt::Display for OffsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|o| format!("UTC{:+}", o)).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Wrap any hour value into `[0, 24)`.
pub fn normalize_hour(hour: f64) -> f64 {
    let h = hour.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can round up to exactly 24.0 for tiny negative inputs
    if h >= HOURS_PER_DAY {
        0.0
    } else {
        h
    }
}

/// Running statistics of match start times (UTC hours) for one offset set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRecord {
    /// Mean start time, always in `[0, 24)`.
    pub time: f64,
    pub count: u32,
    /// Unset until `count >= 2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdev: Option<f64>,
}

impl TimeRecord {
    /// First observation for an offset set.
    pub fn first(time: f64) -> Self {
        Self {
            time: normalize_hour(time),
            count: 1,
            stdev: None,
        }
    }

    /// Mean time as a wall-clock UTC time, rounded to the minute.
    pub fn clock(&self) -> NaiveTime {
        let minutes = (self.time * 60.0).round() as u32 % (24 * 60);
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or_default()
    }
}

/// Contiguous window of UTC hours, inclusive on both ends, wrapped into `[0, 24)`.
/// `start > end` means the window crosses midnight UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: u32,
    pub end: u32,
}

impl TimeWindow {
    /// Number of whole hours covered.
    pub fn hours(&self) -> u32 {
        (self.end + 24 - self.start) % 24 + 1
    }

    pub fn contains(&self, hour: u32) -> bool {
        (hour + 24 - self.start) % 24 < self.hours()
    }
}

/// Result of recording a played match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeUpdate {
    pub key: OffsetKey,
    pub previous: Option<TimeRecord>,
    pub current: TimeRecord,
}

/// What the scheduler suggests for a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    /// Prior matches with these offsets exist.
    Consensus { record: TimeRecord },
    /// No history; every player is awake during this window.
    Window { window: TimeWindow },
}

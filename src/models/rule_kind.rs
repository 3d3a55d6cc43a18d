//! Rule type registry: names used in configuration map to rule variants.

use crate::models::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "StarRatingRule")]
    StarRating,
    #[serde(rename = "DrainTimeRule")]
    DrainTime,
    #[serde(rename = "TotalTimeRule")]
    TotalTime,
    #[serde(rename = "LeaderboardRule")]
    Leaderboard,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::StarRating,
        RuleKind::DrainTime,
        RuleKind::TotalTime,
        RuleKind::Leaderboard,
    ];

    /// Registry name as it appears in configuration.
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::StarRating => "StarRatingRule",
            RuleKind::DrainTime => "DrainTimeRule",
            RuleKind::TotalTime => "TotalTimeRule",
            RuleKind::Leaderboard => "LeaderboardRule",
        }
    }

    /// Human-readable subject for messages.
    pub fn label(self) -> &'static str {
        match self {
            RuleKind::StarRating => "Star rating",
            RuleKind::DrainTime => "Drain time",
            RuleKind::TotalTime => "Total length",
            RuleKind::Leaderboard => "Leaderboard",
        }
    }

    pub fn is_time(self) -> bool {
        matches!(self, RuleKind::DrainTime | RuleKind::TotalTime)
    }

    /// Format a value in this rule's unit: `m:ss`, two-decimal stars, or a score count.
    pub fn format_value(self, value: f64) -> String {
        match self {
            RuleKind::StarRating => format!("{:.2}", value),
            RuleKind::DrainTime | RuleKind::TotalTime => format_duration(value),
            RuleKind::Leaderboard => format!("{}", value.round() as i64),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownRule(s.to_string()))
    }
}

/// Seconds as `m:ss` (minutes are not wrapped into hours).
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

//! Tournament configuration: weekly rule ranges per division.

use crate::models::error::ConfigError;
use crate::models::range::ValueRange;
use crate::models::rule_kind::RuleKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Local-time waking window used for cold-start scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_earliest")]
    pub earliest_local_hour: u32,
    #[serde(default = "default_latest")]
    pub latest_local_hour: u32,
}

fn default_earliest() -> u32 {
    10
}

fn default_latest() -> u32 {
    22
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            earliest_local_hour: default_earliest(),
            latest_local_hour: default_latest(),
        }
    }
}

/// One rule for a division: its type, strictness, and a range per week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Strict rules reject outright; others only withhold automatic approval.
    #[serde(default)]
    pub strict: bool,
    /// Indexed by week (see `current_week`). Empty means unconstrained.
    #[serde(default)]
    pub weeks: Vec<ValueRange>,
}

/// How an aggregate folds per-map values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    Sum,
    Average,
}

/// Bounds for a pool-wide aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Pool-wide constraint over one rule type's values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub measure: Measure,
    pub limits: Limits,
}

/// Aggregate with one set of limits per week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub measure: Measure,
    #[serde(default)]
    pub weeks: Vec<Limits>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DivisionConfig {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub aggregates: Vec<AggregateConfig>,
}

/// Whole tournament configuration, usually loaded from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Due date of the first pool; week 1 starts here.
    pub first_due_date: DateTime<Utc>,
    #[serde(default)]
    pub divisions: Vec<DivisionConfig>,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Lifetime of cached leaderboard sizes. None keeps them for the checker's lifetime.
    #[serde(default)]
    pub leaderboard_cache_ttl_secs: Option<u64>,
}

impl TournamentConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn division(&self, name: &str) -> Option<&DivisionConfig> {
        self.divisions.iter().find(|d| d.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for division in &self.divisions {
            if !names.insert(division.name.as_str()) {
                return Err(ConfigError::DuplicateDivision(division.name.clone()));
            }
            for rule in &division.rules {
                for range in &rule.weeks {
                    range.validate()?;
                }
            }
            for aggregate in &division.aggregates {
                for limits in &aggregate.weeks {
                    if let (Some(min), Some(max)) = (limits.min, limits.max) {
                        if min > max {
                            return Err(ConfigError::InvalidRange(format!(
                                "{} aggregate in {}: min {} is above max {}",
                                aggregate.kind, division.name, min, max
                            )));
                        }
                    }
                }
            }
        }
        let s = self.scheduler;
        if s.earliest_local_hour > s.latest_local_hour || s.latest_local_hour > 23 {
            return Err(ConfigError::InvalidRange(format!(
                "waking window {}..{} must lie within 0..23",
                s.earliest_local_hour, s.latest_local_hour
            )));
        }
        Ok(())
    }
}

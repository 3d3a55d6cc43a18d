//! Checker: runs a division's rules over one beatmap or a whole pool.

use crate::logic::leaderboard::{LeaderboardSource, ScoreCounter};
use crate::logic::rules::{Rule, RuleInput};
use crate::logic::week::current_week;
use crate::models::{
    Aggregate, Beatmap, ConfigError, DivisionConfig, LookupError, Measure, Outcome, RuleKind,
    TournamentConfig,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Message for a map that passed every rule.
pub const AUTO_ACCEPT_MESSAGE: &str = "accepted automatically";

/// Outcome of checking a single beatmap.
///
/// - `passed = false`: rejected, `message` says why
/// - `passed = true, approved = false`: accepted pending manual approval
/// - `passed = true, approved = true`: accepted automatically
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub approved: bool,
    pub message: String,
}

/// Advisory findings for a whole pool. Nothing here mutates the pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolReport {
    pub messages: Vec<String>,
    pub duplicates: Vec<Beatmap>,
}

pub struct Checker {
    rules: Vec<Rule>,
    aggregates: Vec<Aggregate>,
    scores: ScoreCounter,
}

impl Checker {
    pub fn new(
        rules: Vec<Rule>,
        aggregates: Vec<Aggregate>,
        source: Arc<dyn LeaderboardSource>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            rules,
            aggregates,
            scores: ScoreCounter::new(source, cache_ttl),
        }
    }

    /// Build a checker for `division` using the ranges of the week containing `now`.
    pub fn for_division(
        division: &DivisionConfig,
        first_due_date: DateTime<Utc>,
        now: DateTime<Utc>,
        source: Arc<dyn LeaderboardSource>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        let rules = division
            .rules
            .iter()
            .map(|rc| match current_week(now, first_due_date, rc.weeks.len()) {
                Some(week) => Rule::new(rc.kind, rc.weeks[week], rc.strict),
                None => Rule::unconstrained(rc.kind, rc.strict),
            })
            .collect();
        let aggregates = division
            .aggregates
            .iter()
            .filter_map(|ac| {
                let week = current_week(now, first_due_date, ac.weeks.len())?;
                Some(Aggregate {
                    kind: ac.kind,
                    measure: ac.measure,
                    limits: ac.weeks[week],
                })
            })
            .collect();
        Self::new(rules, aggregates, source, cache_ttl)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn score_counter(&self) -> &ScoreCounter {
        &self.scores
    }

    /// Run every rule in configured order.
    ///
    /// Any non-passing rule withdraws automatic approval. A strict rule that fails
    /// (beyond its buffer) rejects the map and stops evaluation.
    pub async fn check(&self, beatmap: &Beatmap) -> Result<Verdict, LookupError> {
        let mut verdict = Verdict {
            passed: true,
            approved: true,
            message: AUTO_ACCEPT_MESSAGE.to_string(),
        };
        for rule in &self.rules {
            let result = rule.check(RuleInput::Map(beatmap), &self.scores).await?;
            if result.is_passed() {
                continue;
            }
            verdict.approved = false;
            verdict.message = result
                .message
                .unwrap_or_else(|| format!("{} check did not pass", rule.kind.label()));
            if rule.strict && result.result == Outcome::Failed {
                verdict.passed = false;
                log::debug!("Beatmap {} rejected: {}", beatmap, verdict.message);
                break;
            }
        }
        Ok(verdict)
    }

    /// Pool-wide checks: duplicate maps, too many maps in a buffer zone, aggregate limits.
    pub async fn check_pool(&self, pool: &[Beatmap]) -> Result<PoolReport, LookupError> {
        let mut report = PoolReport::default();

        let mut seen = HashSet::new();
        for map in pool {
            if !seen.insert(map.id()) {
                report.duplicates.push(map.clone());
            }
        }

        let mut buffered: HashMap<RuleKind, usize> = HashMap::new();
        for rule in &self.rules {
            for map in pool {
                let result = rule.check(RuleInput::Map(map), &self.scores).await?;
                if result.result == Outcome::Buffer {
                    *buffered.entry(rule.kind).or_default() += 1;
                }
            }
        }
        let mut warned = HashSet::new();
        for rule in &self.rules {
            let (Some(limit), Some(&count)) = (rule.buffer_count(), buffered.get(&rule.kind)) else {
                continue;
            };
            if count > limit && warned.insert(rule.kind) {
                report.messages.push(format!(
                    "Too many maps in the {} buffer zone ({} > {})",
                    rule.kind.label().to_lowercase(),
                    count,
                    limit
                ));
            }
        }

        for aggregate in &self.aggregates {
            if let Some(message) = self.check_aggregate(aggregate, pool).await? {
                report.messages.push(message);
            }
        }

        if !report.messages.is_empty() || !report.duplicates.is_empty() {
            log::info!(
                "Pool check found {} warning(s) and {} duplicate(s)",
                report.messages.len(),
                report.duplicates.len()
            );
        }
        Ok(report)
    }

    async fn check_aggregate(
        &self,
        aggregate: &Aggregate,
        pool: &[Beatmap],
    ) -> Result<Option<String>, LookupError> {
        let probe = Rule::unconstrained(aggregate.kind, false);
        let mut sum = 0.0;
        let mut count = 0usize;
        for map in pool {
            if let Some(v) = probe.value(RuleInput::Map(map), &self.scores).await? {
                sum += v;
                count += 1;
            }
        }
        let value = match aggregate.measure {
            Measure::Sum => sum,
            Measure::Average if count == 0 => return Ok(None),
            Measure::Average => sum / count as f64,
        };
        let what = match aggregate.measure {
            Measure::Sum => "Total",
            Measure::Average => "Average",
        };
        let subject = format!("{} {} of the pool", what, aggregate.kind.label().to_lowercase());
        let fmt = |v: f64| aggregate.kind.format_value(v);
        if let Some(min) = aggregate.limits.min.filter(|&min| value < min) {
            return Ok(Some(format!("{} is too low ({} < {})", subject, fmt(value), fmt(min))));
        }
        if let Some(max) = aggregate.limits.max.filter(|&max| value > max) {
            return Ok(Some(format!("{} is too high ({} > {})", subject, fmt(value), fmt(max))));
        }
        Ok(None)
    }
}

/// One checker per division for the week containing `now`. Each gets a fresh leaderboard cache.
pub fn refresh_checkers(
    config: &TournamentConfig,
    now: DateTime<Utc>,
    source: Arc<dyn LeaderboardSource>,
) -> Result<HashMap<String, Checker>, ConfigError> {
    config.validate()?;
    let ttl = config.leaderboard_cache_ttl_secs.map(Duration::from_secs);
    let checkers: HashMap<String, Checker> = config
        .divisions
        .iter()
        .map(|d| {
            let checker =
                Checker::for_division(d, config.first_due_date, now, Arc::clone(&source), ttl);
            (d.name.clone(), checker)
        })
        .collect();
    log::info!("Built checkers for {} division(s)", checkers.len());
    Ok(checkers)
}

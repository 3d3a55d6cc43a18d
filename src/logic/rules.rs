//! Single-value rules: star rating, drain time, total length, leaderboard depth.

use crate::logic::leaderboard::ScoreCounter;
use crate::models::{Beatmap, CheckResult, LookupError, Outcome, RuleKind, ValueRange};

/// What a rule is checked against: a beatmap of either shape, or a raw number.
#[derive(Clone, Copy, Debug)]
pub enum RuleInput<'a> {
    Map(&'a Beatmap),
    Value(f64),
}

impl<'a> From<&'a Beatmap> for RuleInput<'a> {
    fn from(map: &'a Beatmap) -> Self {
        RuleInput::Map(map)
    }
}

impl From<f64> for RuleInput<'_> {
    fn from(value: f64) -> Self {
        RuleInput::Value(value)
    }
}

/// Star rating from either shape.
pub fn star_rating(map: &Beatmap) -> Option<f64> {
    match map {
        Beatmap::Live(m) => Some(m.difficultyrating),
        Beatmap::Pool(m) => Some(m.stars),
    }
}

/// Drain time (seconds) from either shape.
pub fn drain_time(map: &Beatmap) -> Option<f64> {
    match map {
        Beatmap::Live(m) => Some(m.hit_length),
        Beatmap::Pool(m) => Some(m.drain),
    }
}

/// Total length (seconds); pool documents don't always carry it.
pub fn total_time(map: &Beatmap) -> Option<f64> {
    match map {
        Beatmap::Live(m) => Some(m.total_length),
        Beatmap::Pool(m) => m.length,
    }
}

/// Whether the map's ranked status implies an osu! leaderboard.
/// Pool documents without a status are assumed to have one.
pub fn has_leaderboard(map: &Beatmap) -> bool {
    map.status().map_or(true, |s| s > 0)
}

/// Field value for a rule kind that needs no lookup. `None` for the leaderboard.
pub fn extract(kind: RuleKind, map: &Beatmap) -> Option<f64> {
    match kind {
        RuleKind::StarRating => star_rating(map),
        RuleKind::DrainTime => drain_time(map),
        RuleKind::TotalTime => total_time(map),
        RuleKind::Leaderboard => None,
    }
}

/// One configured check. `range = None` means this week has no constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub range: Option<ValueRange>,
    pub strict: bool,
}

impl Rule {
    pub fn new(kind: RuleKind, range: ValueRange, strict: bool) -> Self {
        Self {
            kind,
            range: Some(range),
            strict,
        }
    }

    pub fn unconstrained(kind: RuleKind, strict: bool) -> Self {
        Self {
            kind,
            range: None,
            strict,
        }
    }

    /// Maps allowed in this rule's buffer zone per pool, if capped.
    pub fn buffer_count(&self) -> Option<usize> {
        self.range.and_then(|r| r.buffer_count)
    }

    /// Numeric value this rule looks at. Leaderboard size may need an upstream lookup.
    pub async fn value(
        &self,
        input: RuleInput<'_>,
        scores: &ScoreCounter,
    ) -> Result<Option<f64>, LookupError> {
        let map = match input {
            RuleInput::Value(v) => return Ok(Some(v)),
            RuleInput::Map(map) => map,
        };
        if self.kind != RuleKind::Leaderboard {
            return Ok(extract(self.kind, map));
        }
        if !has_leaderboard(map) {
            return Ok(Some(0.0));
        }
        let count = scores.score_count(map.id(), map.mods()).await?;
        Ok(Some(count as f64))
    }

    /// Classify the input against this rule's range.
    ///
    /// A map missing the rule's field lands in the buffer zone so it needs manual approval.
    pub async fn check(
        &self,
        input: RuleInput<'_>,
        scores: &ScoreCounter,
    ) -> Result<CheckResult, LookupError> {
        let Some(range) = self.range else {
            return Ok(CheckResult::passed(0.0));
        };
        if self.kind == RuleKind::Leaderboard && range.min.is_none() && range.max.is_none() {
            return Ok(CheckResult::passed(0.0));
        }
        let Some(value) = self.value(input, scores).await? else {
            return Ok(CheckResult::new(Outcome::Buffer, f64::NAN, None)
                .with_message(format!("{} is unknown for this map", self.kind.label())));
        };
        Ok(self.check_value(&range, value))
    }

    fn check_value(&self, range: &ValueRange, value: f64) -> CheckResult {
        let result = range.classify(value);
        if result.is_passed() {
            return result;
        }
        let message = self.reject_message(&result);
        result.with_message(message)
    }

    /// Explanation naming the exceeded bound, in the rule's units.
    pub fn reject_message(&self, result: &CheckResult) -> String {
        let Some(expected) = result.expected else {
            return format!("{} is within range", self.kind.label());
        };
        let (word, sign) = match (self.kind, result.is_below()) {
            (RuleKind::StarRating, true) => ("too low", '<'),
            (RuleKind::StarRating, false) => ("too high", '>'),
            (RuleKind::Leaderboard, true) => ("too small", '<'),
            (RuleKind::Leaderboard, false) => ("too large", '>'),
            (_, true) => ("too short", '<'),
            (_, false) => ("too long", '>'),
        };
        let subject = match self.kind {
            RuleKind::Leaderboard => "Leaderboard size",
            kind => kind.label(),
        };
        format!(
            "{} is {} ({} {} {})",
            subject,
            word,
            self.kind.format_value(result.actual),
            sign,
            self.kind.format_value(expected)
        )
    }
}

//! Data structures: beatmaps, ranges and check results, division config, time records.

mod beatmap;
mod division;
mod error;
mod range;
mod rule_kind;
mod time_record;

pub use beatmap::{Beatmap, BeatmapId, LiveBeatmap, Mods, PoolBeatmap};
pub use division::{
    Aggregate, AggregateConfig, DivisionConfig, Limits, Measure, RuleConfig, SchedulerSettings,
    TournamentConfig,
};
pub use error::{ConfigError, LookupError, SchedulerError};
pub use range::{CheckResult, Outcome, ValueRange};
pub use rule_kind::{format_duration, RuleKind};
pub use time_record::{
    normalize_hour, OffsetKey, Proposal, TimeRecord, TimeUpdate, TimeWindow, HOURS_PER_DAY,
};

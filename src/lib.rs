//! osu! tournament map pools: library with models and business logic.

pub mod logic;
pub mod models;

pub use logic::{
    current_week, refresh_checkers, update_record, verify_offsets, week_number, Checker,
    LeaderboardSource, MemoryTimeStore, NoLeaderboard, OsuApiClient, PoolReport, Rule, RuleInput,
    Scheduler, Score, ScoreCounter, TimeRecordStore, Verdict, AUTO_ACCEPT_MESSAGE,
};
pub use models::{
    Aggregate, AggregateConfig, Beatmap, BeatmapId, CheckResult, ConfigError, DivisionConfig,
    Limits, LiveBeatmap, LookupError, Measure, Mods, OffsetKey, Outcome, PoolBeatmap, Proposal,
    RuleConfig, RuleKind, SchedulerError, SchedulerSettings, TimeRecord, TimeUpdate, TimeWindow,
    TournamentConfig, ValueRange,
};

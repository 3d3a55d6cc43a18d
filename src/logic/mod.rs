//! Core logic: rule evaluation, pool checks, weekly refresh, and match scheduling.

mod checker;
mod leaderboard;
mod rules;
mod scheduler;
mod store;
mod week;

pub use checker::{refresh_checkers, Checker, PoolReport, Verdict, AUTO_ACCEPT_MESSAGE};
pub use leaderboard::{LeaderboardSource, NoLeaderboard, OsuApiClient, Score, ScoreCounter};
pub use rules::{extract, has_leaderboard, Rule, RuleInput};
pub use scheduler::{
    unwrap_toward, update_record, verify_offsets, Scheduler, MAX_UPDATE_ATTEMPTS,
};
pub use store::{MemoryTimeStore, TimeRecordStore};
pub use week::{current_week, week_number};

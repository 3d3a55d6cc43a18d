//! Integration tests for the checker: single-map verdicts, pool reports, weekly refresh.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use osu_map_pools::{
    current_week, refresh_checkers, Aggregate, Beatmap, BeatmapId, Checker, LeaderboardSource,
    Limits, LiveBeatmap, LookupError, Measure, Mods, PoolBeatmap, Rule, RuleKind, Score,
    TournamentConfig, ValueRange, AUTO_ACCEPT_MESSAGE,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed leaderboard sizes per beatmap, counting lookups.
#[derive(Default)]
struct FakeLeaderboard {
    sizes: HashMap<BeatmapId, usize>,
    calls: AtomicUsize,
}

#[async_trait]
impl LeaderboardSource for FakeLeaderboard {
    async fn scores(&self, beatmap_id: BeatmapId, _mods: Mods) -> Result<Vec<Score>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.sizes.get(&beatmap_id) {
            Some(&n) => Ok(vec![Score::default(); n]),
            None => Err(LookupError::Status(404)),
        }
    }
}

fn pool_map(bid: BeatmapId, drain: f64, stars: f64) -> Beatmap {
    Beatmap::Pool(PoolBeatmap {
        bid,
        mods: 0,
        drain,
        stars,
        length: Some(drain + 10.0),
        status: Some(1),
        artist: None,
        title: None,
        version: None,
    })
}

fn live_map(bid: BeatmapId, approved: i32) -> Beatmap {
    Beatmap::Live(LiveBeatmap {
        beatmap_id: bid,
        hit_length: 120.0,
        total_length: 130.0,
        difficultyrating: 5.5,
        approved,
        mods: 0,
        artist: None,
        title: None,
        version: None,
    })
}

fn checker(rules: Vec<Rule>, aggregates: Vec<Aggregate>) -> Checker {
    Checker::new(rules, aggregates, Arc::new(FakeLeaderboard::default()), None)
}

#[tokio::test]
async fn all_rules_passing_is_automatic() {
    let c = checker(
        vec![
            Rule::new(RuleKind::StarRating, ValueRange::between(5.0, 6.0), true),
            Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0), true),
        ],
        vec![],
    );
    let v = c.check(&pool_map(1, 120.0, 5.5)).await.unwrap();
    assert!(v.passed);
    assert!(v.approved);
    assert_eq!(v.message, AUTO_ACCEPT_MESSAGE);
}

#[tokio::test]
async fn strict_failure_rejects_and_stops() {
    let c = checker(
        vec![
            Rule::new(RuleKind::StarRating, ValueRange::between(5.0, 6.0), true),
            Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0), false),
        ],
        vec![],
    );
    // both rules fail; the strict star rating rule is first and stops evaluation
    let v = c.check(&pool_map(1, 30.0, 7.0)).await.unwrap();
    assert!(!v.passed);
    assert!(!v.approved);
    assert!(v.message.starts_with("Star rating is too high"));
}

#[tokio::test]
async fn strict_buffer_only_withholds_approval() {
    let c = checker(
        vec![Rule::new(
            RuleKind::DrainTime,
            ValueRange::between(90.0, 240.0).with_buffer(15.0),
            true,
        )],
        vec![],
    );
    let v = c.check(&pool_map(1, 250.0, 5.5)).await.unwrap();
    assert!(v.passed);
    assert!(!v.approved);
    assert!(v.message.starts_with("Drain time is too long"));
}

#[tokio::test]
async fn non_strict_failure_withholds_approval() {
    let c = checker(
        vec![Rule::new(RuleKind::StarRating, ValueRange::between(5.0, 6.0), false)],
        vec![],
    );
    let v = c.check(&pool_map(1, 120.0, 9.0)).await.unwrap();
    assert!(v.passed);
    assert!(!v.approved);
}

#[tokio::test]
async fn later_strict_failure_still_rejects() {
    let c = checker(
        vec![
            Rule::new(RuleKind::StarRating, ValueRange::between(5.0, 6.0), false),
            Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0), true),
        ],
        vec![],
    );
    let v = c.check(&pool_map(1, 10.0, 9.0)).await.unwrap();
    assert!(!v.passed);
    assert!(v.message.starts_with("Drain time is too short"));
}

#[tokio::test]
async fn leaderboard_lookups_are_cached_and_skipped_for_unranked() {
    let source = Arc::new(FakeLeaderboard {
        sizes: HashMap::from([(10, 80), (11, 5)]),
        calls: AtomicUsize::new(0),
    });
    let c = Checker::new(
        vec![Rule::new(RuleKind::Leaderboard, ValueRange::at_least(50.0), true)],
        vec![],
        source.clone(),
        None,
    );

    assert!(c.check(&live_map(10, 1)).await.unwrap().approved);
    assert!(c.check(&live_map(10, 1)).await.unwrap().approved);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    let v = c.check(&live_map(11, 1)).await.unwrap();
    assert!(!v.passed);
    assert_eq!(v.message, "Leaderboard size is too small (5 < 50)");

    // graveyarded maps have no leaderboard; no lookup happens
    let v = c.check(&live_map(12, -2)).await.unwrap();
    assert!(!v.passed);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(c.score_counter().cached_len(), 2);
}

#[tokio::test]
async fn lookup_failure_propagates() {
    let c = checker(
        vec![Rule::new(RuleKind::Leaderboard, ValueRange::at_least(50.0), true)],
        vec![],
    );
    assert!(matches!(
        c.check(&live_map(99, 1)).await,
        Err(LookupError::Status(404))
    ));
}

#[tokio::test]
async fn pool_flags_one_duplicate() {
    let c = checker(vec![], vec![]);
    let mut pool: Vec<Beatmap> = (1..=9).map(|i| pool_map(i, 120.0, 5.5)).collect();
    pool.push(pool_map(4, 120.0, 5.5));
    let report = c.check_pool(&pool).await.unwrap();
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].id(), 4);
    assert!(report.messages.is_empty());
}

#[tokio::test]
async fn pool_warns_when_buffer_zone_is_crowded() {
    let range = ValueRange::between(90.0, 240.0)
        .with_buffer(15.0)
        .with_buffer_count(1);
    let c = checker(vec![Rule::new(RuleKind::DrainTime, range, true)], vec![]);

    let one = vec![pool_map(1, 250.0, 5.0), pool_map(2, 120.0, 5.0)];
    assert!(c.check_pool(&one).await.unwrap().messages.is_empty());

    let two = vec![pool_map(1, 250.0, 5.0), pool_map(2, 80.0, 5.0), pool_map(3, 120.0, 5.0)];
    let report = c.check_pool(&two).await.unwrap();
    assert_eq!(report.messages, vec!["Too many maps in the drain time buffer zone (2 > 1)"]);
}

#[tokio::test]
async fn pool_aggregates_are_checked() {
    let c = checker(
        vec![],
        vec![
            Aggregate {
                kind: RuleKind::DrainTime,
                measure: Measure::Sum,
                limits: Limits { min: Some(900.0), max: None },
            },
            Aggregate {
                kind: RuleKind::StarRating,
                measure: Measure::Average,
                limits: Limits { min: None, max: Some(6.0) },
            },
        ],
    );
    let pool: Vec<Beatmap> = (1..=5).map(|i| pool_map(i, 120.0, 6.5)).collect();
    let report = c.check_pool(&pool).await.unwrap();
    assert_eq!(
        report.messages,
        vec![
            "Total drain time of the pool is too low (10:00 < 15:00)",
            "Average star rating of the pool is too high (6.50 > 6.00)",
        ]
    );
}

fn config() -> TournamentConfig {
    TournamentConfig::from_json(
        r#"{
            "first_due_date": "2026-01-10T00:00:00Z",
            "divisions": [
                {
                    "name": "Open",
                    "rules": [
                        { "type": "StarRatingRule", "strict": true,
                          "weeks": [ { "min": 4.0, "max": 5.0 }, { "min": 5.0, "max": 6.0 }, { "min": 6.0, "max": 7.0 } ] },
                        { "type": "LeaderboardRule", "weeks": [] }
                    ],
                    "aggregates": [
                        { "type": "DrainTimeRule", "weeks": [ { "min": 600 } ] }
                    ]
                },
                { "name": "Lower", "rules": [] }
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn current_week_is_clamped() {
    let first = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
    assert_eq!(current_week(first - Duration::days(3), first, 3), Some(0));
    assert_eq!(current_week(first + Duration::days(1), first, 3), Some(1));
    assert_eq!(current_week(first + Duration::days(8), first, 3), Some(2));
    assert_eq!(current_week(first + Duration::days(60), first, 3), Some(2));
    assert_eq!(current_week(first - Duration::days(30), first, 3), Some(0));
    assert_eq!(current_week(first, first, 0), None);
}

#[tokio::test]
async fn refresh_builds_one_checker_per_division_for_the_week() {
    let config = config();
    let now = Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap();
    let checkers = refresh_checkers(&config, now, Arc::new(FakeLeaderboard::default())).unwrap();
    assert_eq!(checkers.len(), 2);

    let open = &checkers["Open"];
    assert_eq!(open.rules()[0].range, Some(ValueRange::between(5.0, 6.0)));
    assert_eq!(open.rules()[1].range, None);
    assert_eq!(open.aggregates().len(), 1);

    // unconfigured leaderboard rule passes without a lookup
    let v = open.check(&live_map(1, 1)).await.unwrap();
    assert!(v.approved);
}

#[test]
fn config_rejects_invalid_ranges_and_unknown_rules() {
    let bad_range = r#"{ "first_due_date": "2026-01-10T00:00:00Z",
        "divisions": [ { "name": "A", "rules": [ { "type": "DrainTimeRule", "weeks": [ { "min": 10, "max": 5 } ] } ] } ] }"#;
    assert!(TournamentConfig::from_json(bad_range).is_err());

    let unknown = r#"{ "first_due_date": "2026-01-10T00:00:00Z",
        "divisions": [ { "name": "A", "rules": [ { "type": "SpeedRule" } ] } ] }"#;
    assert!(TournamentConfig::from_json(unknown).is_err());

    let dup = r#"{ "first_due_date": "2026-01-10T00:00:00Z",
        "divisions": [ { "name": "A" }, { "name": "A" } ] }"#;
    assert!(TournamentConfig::from_json(dup).is_err());
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pools.json");
    std::fs::write(&path, serde_json::to_string(&config()).unwrap()).unwrap();
    let loaded = TournamentConfig::load(&path).unwrap();
    assert_eq!(loaded, config());
    assert_eq!(loaded.scheduler.earliest_local_hour, 10);
}

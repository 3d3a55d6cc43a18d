//! Integration tests for single rules: range classification, field extraction, messages.

use osu_map_pools::{
    Beatmap, LiveBeatmap, NoLeaderboard, Outcome, PoolBeatmap, Rule, RuleInput, RuleKind,
    ScoreCounter, ValueRange,
};
use std::sync::Arc;

fn no_lookups() -> ScoreCounter {
    ScoreCounter::new(Arc::new(NoLeaderboard), None)
}

fn live_map(drain: f64, total: f64, stars: f64) -> Beatmap {
    Beatmap::Live(LiveBeatmap {
        beatmap_id: 129891,
        hit_length: drain,
        total_length: total,
        difficultyrating: stars,
        approved: 1,
        mods: 0,
        artist: None,
        title: None,
        version: None,
    })
}

fn pool_map(drain: f64, stars: f64) -> Beatmap {
    Beatmap::Pool(PoolBeatmap {
        bid: 75,
        mods: 0,
        drain,
        stars,
        length: None,
        status: None,
        artist: None,
        title: None,
        version: None,
    })
}

#[test]
fn classify_inside_buffer_and_outside() {
    let range = ValueRange::between(90.0, 240.0).with_buffer(15.0);
    assert_eq!(range.classify(90.0).result, Outcome::Passed);
    assert_eq!(range.classify(240.0).result, Outcome::Passed);
    assert_eq!(range.classify(75.0).result, Outcome::Buffer);
    assert_eq!(range.classify(74.9).result, Outcome::Failed);
    assert_eq!(range.classify(250.0).result, Outcome::Buffer);
    assert_eq!(range.classify(255.0).result, Outcome::Buffer);
    assert_eq!(range.classify(260.0).result, Outcome::Failed);
}

#[test]
fn classify_reports_only_the_violated_bound() {
    let range = ValueRange::between(90.0, 240.0).with_buffer(15.0);
    let low = range.classify(60.0);
    assert_eq!(low.expected, Some(90.0));
    assert_eq!(low.actual, 60.0);
    let high = range.classify(300.0);
    assert_eq!(high.expected, Some(240.0));
    assert_eq!(range.classify(120.0).expected, None);
}

#[test]
fn classify_without_buffer_fails_immediately() {
    let range = ValueRange::at_least(5.0);
    assert_eq!(range.classify(4.99).result, Outcome::Failed);
    assert_eq!(range.classify(1000.0).result, Outcome::Passed);
}

#[test]
fn validate_rejects_bad_ranges() {
    assert!(ValueRange::default().validate().is_err());
    assert!(ValueRange::between(5.0, 4.0).validate().is_err());
    assert!(ValueRange::at_most(3.0).with_buffer(-1.0).validate().is_err());
    assert!(ValueRange::between(4.0, 5.0).with_buffer(0.1).validate().is_ok());
}

#[tokio::test]
async fn rules_read_either_beatmap_shape() {
    let scores = no_lookups();
    let drain = Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0), true);
    let stars = Rule::new(RuleKind::StarRating, ValueRange::between(5.0, 6.0), true);

    let live = live_map(100.0, 110.0, 5.5);
    let pool = pool_map(100.0, 5.5);
    for map in [&live, &pool] {
        assert!(drain.check(RuleInput::Map(map), &scores).await.unwrap().is_passed());
        assert!(stars.check(RuleInput::Map(map), &scores).await.unwrap().is_passed());
    }
}

#[tokio::test]
async fn raw_numbers_pass_through() {
    let scores = no_lookups();
    let rule = Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0).with_buffer(15.0), true);
    let r = rule.check(RuleInput::Value(250.0), &scores).await.unwrap();
    assert_eq!(r.result, Outcome::Buffer);
    let r = rule.check(RuleInput::Value(260.0), &scores).await.unwrap();
    assert_eq!(r.result, Outcome::Failed);
}

#[tokio::test]
async fn missing_field_needs_manual_approval() {
    let scores = no_lookups();
    let rule = Rule::new(RuleKind::TotalTime, ValueRange::at_most(300.0), true);
    let r = rule.check(RuleInput::Map(&pool_map(100.0, 5.0)), &scores).await.unwrap();
    assert_eq!(r.result, Outcome::Buffer);
    assert!(r.message.unwrap().contains("unknown"));
}

#[tokio::test]
async fn unconfigured_rule_always_passes() {
    let scores = no_lookups();
    let rule = Rule::unconstrained(RuleKind::StarRating, true);
    let r = rule.check(RuleInput::Map(&live_map(10.0, 10.0, 12.0)), &scores).await.unwrap();
    assert!(r.is_passed());
}

#[tokio::test]
async fn messages_use_rule_units() {
    let scores = no_lookups();
    let drain = Rule::new(RuleKind::DrainTime, ValueRange::between(90.0, 240.0), true);
    let r = drain.check(RuleInput::Value(70.0), &scores).await.unwrap();
    assert_eq!(r.message.as_deref(), Some("Drain time is too short (1:10 < 1:30)"));

    let stars = Rule::new(RuleKind::StarRating, ValueRange::at_most(5.8), false);
    let r = stars.check(RuleInput::Value(6.123), &scores).await.unwrap();
    assert_eq!(r.message.as_deref(), Some("Star rating is too high (6.12 > 5.80)"));
}

#[test]
fn registry_resolves_rule_names() {
    for kind in RuleKind::ALL {
        assert_eq!(kind.name().parse::<RuleKind>().unwrap(), kind);
    }
    assert!("SpeedRule".parse::<RuleKind>().is_err());
}

#[test]
fn live_shape_accepts_api_strings() {
    let json = r#"{
        "beatmap_id": "129891", "hit_length": "218", "total_length": "230",
        "difficultyrating": "5.71", "approved": "1", "title": "Freedom Dive"
    }"#;
    let map: Beatmap = serde_json::from_str(json).unwrap();
    match map {
        Beatmap::Live(m) => {
            assert_eq!(m.beatmap_id, 129891);
            assert_eq!(m.hit_length, 218.0);
            assert_eq!(m.mods, 0);
        }
        Beatmap::Pool(_) => panic!("expected live shape"),
    }

    let pool: Beatmap = serde_json::from_str(r#"{ "bid": 75, "mods": 8, "drain": 120, "stars": 4.2 }"#).unwrap();
    assert_eq!(pool.id(), 75);
    assert_eq!(pool.mods(), 8);
}

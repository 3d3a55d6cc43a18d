//! Leaderboard lookups: the upstream source, the osu! API client, and the per-checker cache.

use crate::models::{BeatmapId, LookupError, Mods};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Maximum scores the v1 API returns per request.
pub const SCORE_LIMIT: usize = 100;

/// One leaderboard entry. Only the number of entries matters to the rules.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub score_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
}

/// Where leaderboard scores come from.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn scores(&self, beatmap_id: BeatmapId, mods: Mods) -> Result<Vec<Score>, LookupError>;
}

/// Source used when no API key is configured; every lookup fails.
pub struct NoLeaderboard;

#[async_trait]
impl LeaderboardSource for NoLeaderboard {
    async fn scores(&self, beatmap_id: BeatmapId, _mods: Mods) -> Result<Vec<Score>, LookupError> {
        Err(LookupError::Unavailable(format!(
            "no osu! API key configured (beatmap {})",
            beatmap_id
        )))
    }
}

/// osu! API v1 client (`/api/get_scores`).
pub struct OsuApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OsuApiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_defaults(api_key: String) -> Self {
        Self::new(api_key, "https://osu.ppy.sh".to_string())
    }
}

#[async_trait]
impl LeaderboardSource for OsuApiClient {
    async fn scores(&self, beatmap_id: BeatmapId, mods: Mods) -> Result<Vec<Score>, LookupError> {
        let url = format!("{}/api/get_scores", self.base_url);
        log::debug!("Fetching leaderboard for beatmap {} (mods {})", beatmap_id, mods);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("k", self.api_key.clone()),
                ("b", beatmap_id.to_string()),
                ("mods", mods.to_string()),
                ("limit", SCORE_LIMIT.to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        Ok(response.json::<Vec<Score>>().await?)
    }
}

struct CachedCount {
    count: usize,
    fetched_at: Instant,
}

/// Memoizes leaderboard sizes by beatmap id so a batch check looks each map up once.
///
/// Owned by a `Checker`; rebuilding the checker starts with an empty cache.
pub struct ScoreCounter {
    source: Arc<dyn LeaderboardSource>,
    cache: Mutex<HashMap<BeatmapId, CachedCount>>,
    ttl: Option<Duration>,
}

impl ScoreCounter {
    pub fn new(source: Arc<dyn LeaderboardSource>, ttl: Option<Duration>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn cached(&self, beatmap_id: BeatmapId) -> Option<usize> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(&beatmap_id)?;
        match self.ttl {
            Some(ttl) if entry.fetched_at.elapsed() >= ttl => None,
            _ => Some(entry.count),
        }
    }

    /// Number of scores on the map's leaderboard. Lookup errors are returned as-is.
    pub async fn score_count(&self, beatmap_id: BeatmapId, mods: Mods) -> Result<usize, LookupError> {
        if let Some(count) = self.cached(beatmap_id) {
            log::debug!("Leaderboard cache hit for beatmap {}", beatmap_id);
            return Ok(count);
        }
        // lock is not held across the lookup; two concurrent misses may both fetch
        let count = self.source.scores(beatmap_id, mods).await?.len();
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                beatmap_id,
                CachedCount {
                    count,
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(count)
    }

    /// Number of beatmaps currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

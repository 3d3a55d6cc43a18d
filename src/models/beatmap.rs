//! Beatmap shapes: the live osu! API shape and the persisted pool shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// osu! beatmap id.
pub type BeatmapId = u64;

/// Mods bitmask as used by the osu! API (`0` = no mod).
pub type Mods = u32;

/// Beatmap as returned by the osu! API (`get_beatmaps`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiveBeatmap {
    #[serde(deserialize_with = "lenient")]
    pub beatmap_id: BeatmapId,
    /// Drain time in seconds.
    #[serde(deserialize_with = "lenient")]
    pub hit_length: f64,
    /// Total length in seconds.
    #[serde(deserialize_with = "lenient")]
    pub total_length: f64,
    #[serde(deserialize_with = "lenient")]
    pub difficultyrating: f64,
    /// Ranked status: 4 loved, 3 qualified, 2 approved, 1 ranked, 0 pending, -1 WIP, -2 graveyard.
    #[serde(deserialize_with = "lenient")]
    pub approved: i32,
    /// Not part of the API response; set by the caller for the requested mod.
    #[serde(default, deserialize_with = "lenient")]
    pub mods: Mods,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Beatmap as stored in a team's pool document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolBeatmap {
    pub bid: BeatmapId,
    #[serde(default)]
    pub mods: Mods,
    /// Drain time in seconds.
    pub drain: f64,
    pub stars: f64,
    /// Total length in seconds, when known.
    #[serde(default)]
    pub length: Option<f64>,
    /// Ranked status, when known (same encoding as [`LiveBeatmap::approved`]).
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Either shape of beatmap. Rules accept both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Beatmap {
    Live(LiveBeatmap),
    Pool(PoolBeatmap),
}

impl Beatmap {
    pub fn id(&self) -> BeatmapId {
        match self {
            Beatmap::Live(m) => m.beatmap_id,
            Beatmap::Pool(m) => m.bid,
        }
    }

    pub fn mods(&self) -> Mods {
        match self {
            Beatmap::Live(m) => m.mods,
            Beatmap::Pool(m) => m.mods,
        }
    }

    /// Ranked status if the shape carries one.
    pub fn status(&self) -> Option<i32> {
        match self {
            Beatmap::Live(m) => Some(m.approved),
            Beatmap::Pool(m) => m.status,
        }
    }
}

impl From<LiveBeatmap> for Beatmap {
    fn from(m: LiveBeatmap) -> Self {
        Beatmap::Live(m)
    }
}

impl From<PoolBeatmap> for Beatmap {
    fn from(m: PoolBeatmap) -> Self {
        Beatmap::Pool(m)
    }
}

/// `Artist - Title [Version]`, or `#<id>` when names are missing.
impl fmt::Display for Beatmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (artist, title, version) = match self {
            Beatmap::Live(m) => (&m.artist, &m.title, &m.version),
            Beatmap::Pool(m) => (&m.artist, &m.title, &m.version),
        };
        match (artist, title, version) {
            (Some(a), Some(t), Some(v)) => write!(f, "{} - {} [{}]", a, t, v),
            _ => write!(f, "#{}", self.id()),
        }
    }
}

/// Accept a JSON number or a numeric string (the v1 API sends everything as strings).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Value(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Value(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

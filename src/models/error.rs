//! Error types for configuration, leaderboard lookups, and scheduling.

/// Invalid or unreadable division configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Unknown rule type: {0}")]
    UnknownRule(String),

    #[error("Duplicate division: {0}")]
    DuplicateDivision(String),
}

/// Failure of the upstream leaderboard lookup. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Leaderboard lookup unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("osu! API returned status {0}")]
    Status(u16),
}

/// Errors from recording a match time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Match time must be a finite number of hours, got {0}")]
    InvalidTime(f64),

    #[error("No valid offsets given")]
    NoOffsets,

    #[error("Time record for {0} kept changing; gave up after {1} attempts")]
    Contended(String, usize),
}

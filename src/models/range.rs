//! ValueRange (acceptance window) and CheckResult (outcome of one check).

use crate::models::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Numeric acceptance window with an optional tolerance band outside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Width of the buffer zone on either side of `[min, max]`.
    #[serde(default)]
    pub buffer: Option<f64>,
    /// How many pool maps may sit in the buffer zone before the pool is flagged.
    #[serde(default)]
    pub buffer_count: Option<usize>,
}

impl ValueRange {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn with_buffer(self, buffer: f64) -> Self {
        Self {
            buffer: Some(buffer),
            ..self
        }
    }

    pub fn with_buffer_count(self, count: usize) -> Self {
        Self {
            buffer_count: Some(count),
            ..self
        }
    }

    /// Buffer width, 0 when unset.
    pub fn buffer(&self) -> f64 {
        self.buffer.unwrap_or(0.0)
    }

    /// At least one bound, `min <= max`, finite values, non-negative buffer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min.is_none() && self.max.is_none() {
            return Err(ConfigError::InvalidRange("range needs a min or a max".into()));
        }
        let finite = [self.min, self.max, self.buffer]
            .iter()
            .flatten()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::InvalidRange("range values must be finite".into()));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ConfigError::InvalidRange(format!("min {} is above max {}", min, max)));
            }
        }
        if self.buffer() < 0.0 {
            return Err(ConfigError::InvalidRange("buffer cannot be negative".into()));
        }
        Ok(())
    }

    /// Classify `value` against the range. Only the violated bound is reported.
    ///
    /// - below `min`: `Buffer` if within `min - buffer`, else `Failed`
    /// - above `max`: `Buffer` if within `max + buffer`, else `Failed`
    /// - otherwise `Passed`
    pub fn classify(&self, value: f64) -> CheckResult {
        let buffer = self.buffer();
        if let Some(min) = self.min.filter(|&min| value < min) {
            let outcome = if value >= min - buffer {
                Outcome::Buffer
            } else {
                Outcome::Failed
            };
            return CheckResult::new(outcome, value, Some(min));
        }
        if let Some(max) = self.max.filter(|&max| value > max) {
            let outcome = if value <= max + buffer {
                Outcome::Buffer
            } else {
                Outcome::Failed
            };
            return CheckResult::new(outcome, value, Some(max));
        }
        CheckResult::new(Outcome::Passed, value, None)
    }
}

/// Three-way verdict of a single check.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Buffer,
    Failed,
}

/// Result of checking one value against one range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub result: Outcome,
    /// The bound that was violated (min or max), if any.
    pub expected: Option<f64>,
    pub actual: f64,
    pub message: Option<String>,
}

impl CheckResult {
    pub fn new(result: Outcome, actual: f64, expected: Option<f64>) -> Self {
        Self {
            result,
            expected,
            actual,
            message: None,
        }
    }

    pub fn passed(actual: f64) -> Self {
        Self::new(Outcome::Passed, actual, None)
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    pub fn is_passed(&self) -> bool {
        self.result == Outcome::Passed
    }

    /// True when the value sits below the bound it violated.
    pub fn is_below(&self) -> bool {
        self.expected.map_or(false, |e| self.actual < e)
    }
}

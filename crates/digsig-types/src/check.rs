//! Statistics freshness classification used by the `chkstats` check.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest day count accepted for thresholds and retention periods.
pub const MAX_DAYS: i64 = 1_000_000;

/// A day count that is negative or larger than [`MAX_DAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid number of days: {0}")]
pub struct InvalidDays(pub i64);

/// Converts a day count into a duration, rejecting negative and oversized
/// values.
pub fn days(count: i64) -> Result<Duration, InvalidDays> {
    if !(0..=MAX_DAYS).contains(&count) {
        return Err(InvalidDays(count));
    }
    Duration::try_days(count).ok_or(InvalidDays(count))
}

/// Result of a monitoring check, in the usual plugin exit-code convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// Statistics are fresh.
    Ok,
    /// Statistics are older than the warning threshold.
    Warning,
    /// Statistics are older than the critical threshold, or absent.
    Critical,
}

impl CheckStatus {
    /// Returns the process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }

    /// Returns the upper-case label for this status.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maximum acceptable ages of the newest statistics entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsThresholds {
    /// Ages up to this value are `Ok`.
    pub warning: Duration,
    /// Ages up to this value are `Warning`; anything older is `Critical`.
    pub critical: Duration,
}

impl StatsThresholds {
    /// Builds thresholds from whole days.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDays` for a negative count or one above [`MAX_DAYS`].
    pub fn from_days(warning: i64, critical: i64) -> Result<Self, InvalidDays> {
        Ok(Self {
            warning: days(warning)?,
            critical: days(critical)?,
        })
    }

    /// Classifies the age of the newest entry.
    ///
    /// Boundaries are inclusive: an age equal to `warning` is still `Ok`.
    pub fn classify(&self, age: Duration) -> CheckStatus {
        if age <= self.warning {
            CheckStatus::Ok
        } else if age <= self.critical {
            CheckStatus::Warning
        } else {
            CheckStatus::Critical
        }
    }
}

impl Default for StatsThresholds {
    fn default() -> Self {
        Self {
            warning: Duration::days(1),
            critical: Duration::days(7),
        }
    }
}

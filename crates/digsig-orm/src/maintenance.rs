//! Periodic maintenance and monitoring over the statistics tables.

use chrono::{DateTime, Utc};
use digsig_types::{CheckStatus, StatsThresholds};
use rusqlite::Connection;

use crate::error::OrmError;
use crate::statistics::{LatestStats, Statistics};

/// Default number of days statistics are kept.
pub const DEFAULT_RETENTION_DAYS: i64 = 365;

/// Outcome of [`refresh_termstats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Statistics rows removed by truncation.
    pub truncated: usize,
    /// Deployments covered by the rebuilt latest-statistics table.
    pub deployments: usize,
}

/// Truncates statistics older than `retention_days` days, then rebuilds the
/// latest-statistics pointers.
///
/// # Errors
///
/// Returns `OrmError::InvalidDays` for a negative or oversized retention,
/// before anything is deleted.
pub fn refresh_termstats(conn: &Connection, retention_days: i64) -> Result<RefreshReport, OrmError> {
    let max_age = digsig_types::days(retention_days)?;
    let truncated = Statistics::truncate(conn, max_age)?;
    let deployments = LatestStats::refresh(conn)?;
    Ok(RefreshReport {
        truncated,
        deployments,
    })
}

/// Freshness of a deployment's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsCheck {
    pub status: CheckStatus,
    /// Timestamp of the newest sample; `None` if the deployment never reported.
    pub latest: Option<DateTime<Utc>>,
}

impl std::fmt::Display for StatsCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.latest {
            Some(latest) => write!(f, "{}", latest.to_rfc3339()),
            None => f.write_str("Never."),
        }
    }
}

/// Classifies how long ago the deployment last reported statistics.
///
/// A deployment that never reported is `Critical`.
pub fn check_statistics(
    conn: &Connection,
    deployment: i64,
    thresholds: &StatsThresholds,
    now: DateTime<Utc>,
) -> Result<StatsCheck, OrmError> {
    let Some(latest) = Statistics::latest(conn, deployment)? else {
        tracing::debug!(deployment, "deployment never reported statistics");
        return Ok(StatsCheck {
            status: CheckStatus::Critical,
            latest: None,
        });
    };

    let status = thresholds.classify(now - latest.timestamp);
    tracing::debug!(deployment, %status, latest = %latest.timestamp, "checked statistics");
    Ok(StatsCheck {
        status,
        latest: Some(latest.timestamp),
    })
}

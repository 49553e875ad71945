//! Usage statistics.
//!
//! Devices report which document they displayed; every report becomes one
//! [`Statistics`] row. Rows are never modified and are only removed by
//! [`Statistics::truncate`]. [`LatestStats`] keeps a pointer to the newest
//! row per deployment for cheap "last seen" lookups.

use chrono::{DateTime, Duration, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::model::{get, insert_returning, select_first, select_where, Model};
use crate::parents::{Address, Deployment};

/// One usage statistics sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub id: i64,
    pub deployment: i64,
    /// The displayed document, at most 255 characters.
    pub document: String,
    pub timestamp: DateTime<Utc>,
}

impl Model for Statistics {
    const KIND: EntityKind = EntityKind::Statistics;
    const COLUMNS: &'static [&'static str] = &["id", "deployment", "document", "timestamp"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deployment: row.get(1)?,
            document: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Statistics {
    /// Records that `document` was displayed on the deployment just now.
    pub fn add(conn: &Connection, deployment: i64, document: &str) -> Result<Self, OrmError> {
        Self::add_at(conn, deployment, document, Utc::now())
    }

    /// Records a sample with an explicit timestamp, e.g. when importing
    /// buffered reports from a device.
    pub fn add_at(
        conn: &Connection,
        deployment: i64,
        document: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO statistics (deployment, document, timestamp) VALUES (?1, ?2, ?3)",
            params![deployment, document, timestamp],
        )
    }

    /// Deletes all samples older than `max_age` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::InvalidRetention` if `max_age` is negative or
    /// reaches before the earliest representable timestamp.
    pub fn truncate(conn: &Connection, max_age: Duration) -> Result<usize, OrmError> {
        if max_age < Duration::zero() {
            return Err(OrmError::InvalidRetention(max_age));
        }
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .ok_or(OrmError::InvalidRetention(max_age))?;
        Self::truncate_before(conn, cutoff)
    }

    /// Deletes all samples taken strictly before `cutoff`.
    pub fn truncate_before(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize, OrmError> {
        let removed = conn.execute("DELETE FROM statistics WHERE timestamp < ?1", [cutoff])?;
        tracing::info!(removed, %cutoff, "truncated statistics");
        Ok(removed)
    }

    /// Returns the newest sample of the deployment, if it ever reported.
    pub fn latest(conn: &Connection, deployment: i64) -> Result<Option<Self>, OrmError> {
        select_first(
            conn,
            "WHERE deployment = ?1 ORDER BY timestamp DESC, id DESC",
            [deployment],
        )
    }

    /// Returns the deployment's samples, newest first, at most `limit` rows.
    pub fn by_deployment(
        conn: &Connection,
        deployment: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Self>, OrmError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        select_where(
            conn,
            "WHERE deployment = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
            params![deployment, limit],
        )
    }

    /// Renders the sample as one CSV line: timestamp, deployment address, document.
    pub fn to_csv(&self, conn: &Connection, sep: &str) -> Result<String, OrmError> {
        let deployment: Deployment = get(conn, self.deployment)?;
        let address: Address = deployment.address(conn)?;
        Ok([
            self.timestamp.to_rfc3339(),
            address.to_string(),
            self.document.clone(),
        ]
        .join(sep))
    }
}

/// Pointer from a deployment to its newest statistics sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestStats {
    pub id: i64,
    pub deployment: i64,
    pub statistics: i64,
}

impl Model for LatestStats {
    const KIND: EntityKind = EntityKind::LatestStats;
    const COLUMNS: &'static [&'static str] = &["id", "deployment", "statistics"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deployment: row.get(1)?,
            statistics: row.get(2)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl LatestStats {
    /// Rebuilds the table from the current statistics and returns the number
    /// of deployments it now covers.
    ///
    /// Runs in one transaction, so readers see either the old or the new
    /// set of pointers.
    pub fn refresh(conn: &Connection) -> Result<usize, OrmError> {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM latest_stats", [])?;
        let refreshed = tx.execute(
            "INSERT INTO latest_stats (deployment, statistics)
             SELECT s.deployment,
                    (SELECT newest.id FROM statistics AS newest
                     WHERE newest.deployment = s.deployment
                     ORDER BY newest.timestamp DESC, newest.id DESC
                     LIMIT 1)
             FROM statistics AS s
             GROUP BY s.deployment",
            [],
        )?;
        tx.commit()?;

        tracing::info!(deployments = refreshed, "refreshed latest statistics");
        Ok(refreshed)
    }

    /// Returns the pointer for a deployment, if it has any statistics.
    pub fn for_deployment(conn: &Connection, deployment: i64) -> Result<Option<Self>, OrmError> {
        select_first(conn, "WHERE deployment = ?1", [deployment])
    }

    /// Loads the statistics sample this pointer refers to.
    pub fn sample(&self, conn: &Connection) -> Result<Statistics, OrmError> {
        get(conn, self.statistics)
    }
}

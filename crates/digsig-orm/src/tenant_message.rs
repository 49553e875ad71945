//! Tenant-to-tenant messages shown on a deployment.
//!
//! Tenants post messages through the device; an operator releases them for
//! display, optionally restricted to a date window.

use chrono::{DateTime, NaiveDate, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::model::{insert_returning, select_where, update_returning, Model};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMessage {
    pub id: i64,
    pub deployment: i64,
    pub message: String,
    pub created: DateTime<Utc>,
    pub released: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Model for TenantMessage {
    const KIND: EntityKind = EntityKind::TenantMessage;
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "deployment",
        "message",
        "created",
        "released",
        "start_date",
        "end_date",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deployment: row.get(1)?,
            message: row.get(2)?,
            created: row.get(3)?,
            released: row.get(4)?,
            start_date: row.get(5)?,
            end_date: row.get(6)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl TenantMessage {
    /// Posts an unreleased message on the deployment.
    pub fn add(conn: &Connection, deployment: i64, message: &str) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO tenant_message (deployment, message, created) VALUES (?1, ?2, ?3)",
            params![deployment, message, Utc::now()],
        )
    }

    /// Releases the message for display between `start_date` and `end_date`
    /// (inclusive, either end open).
    pub fn release(
        &self,
        conn: &Connection,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, OrmError> {
        self.set_release(conn, true, start_date, end_date)
    }

    /// Withdraws a released message and clears its date window.
    pub fn revoke(&self, conn: &Connection) -> Result<Self, OrmError> {
        self.set_release(conn, false, None, None)
    }

    fn set_release(
        &self,
        conn: &Connection,
        released: bool,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, OrmError> {
        update_returning(
            conn,
            "UPDATE tenant_message SET released = ?1, start_date = ?2, end_date = ?3 WHERE id = ?4",
            params![released, start_date, end_date, self.id],
        )?
        .ok_or(OrmError::NotFound {
            table: Self::table(),
            id: self.id,
        })
    }

    /// Returns all messages of a deployment, newest first.
    pub fn by_deployment(conn: &Connection, deployment: i64) -> Result<Vec<Self>, OrmError> {
        select_where(
            conn,
            "WHERE deployment = ?1 ORDER BY created DESC, id DESC",
            [deployment],
        )
    }

    /// Returns the released messages of a deployment whose date window
    /// contains `today`, newest first.
    pub fn visible(
        conn: &Connection,
        deployment: i64,
        today: NaiveDate,
    ) -> Result<Vec<Self>, OrmError> {
        select_where(
            conn,
            "WHERE deployment = ?1
               AND released = 1
               AND (start_date IS NULL OR start_date <= ?2)
               AND (end_date IS NULL OR end_date >= ?2)
             ORDER BY created DESC, id DESC",
            params![deployment, today],
        )
    }
}

//! Hosts the application proxy may forward to.

use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::model::{insert_returning, select_first, select_where, update_returning, Model};

/// An allowed proxy target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHost {
    pub id: i64,
    pub hostname: String,
}

impl Model for ProxyHost {
    const KIND: EntityKind = EntityKind::ProxyHost;
    const COLUMNS: &'static [&'static str] = &["id", "hostname"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hostname: row.get(1)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl ProxyHost {
    /// Allows a host. Hostnames are unique; adding one twice is a
    /// constraint violation.
    pub fn add(conn: &Connection, hostname: &str) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO proxy_hosts (hostname) VALUES (?1)",
            [hostname],
        )
    }

    pub fn by_hostname(conn: &Connection, hostname: &str) -> Result<Option<Self>, OrmError> {
        select_first(conn, "WHERE hostname = ?1", [hostname])
    }

    /// Returns `true` if the proxy may forward to `hostname`.
    pub fn is_allowed(conn: &Connection, hostname: &str) -> Result<bool, OrmError> {
        let allowed: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM proxy_hosts WHERE hostname = ?1)",
            [hostname],
            |row| row.get(0),
        )?;
        Ok(allowed)
    }

    /// Returns all allowed hosts in alphabetical order.
    pub fn all(conn: &Connection) -> Result<Vec<Self>, OrmError> {
        select_where(conn, "ORDER BY hostname ASC", [])
    }

    /// Replaces the hostname of this entry.
    pub fn rename(&self, conn: &Connection, hostname: &str) -> Result<Self, OrmError> {
        update_returning(
            conn,
            "UPDATE proxy_hosts SET hostname = ?1 WHERE id = ?2",
            params![hostname, self.id],
        )?
        .ok_or(OrmError::NotFound {
            table: Self::table(),
            id: self.id,
        })
    }
}

//! Damage reports filed through a deployment.

use chrono::{DateTime, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OrmError;
use crate::model::{insert_returning, select_where, update_returning, Model};

/// A reported physical damage incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    pub id: i64,
    pub deployment: i64,
    pub message: String,
    /// Name of the reporting person.
    pub name: String,
    /// Optional way to reach the reporter.
    pub contact: Option<String>,
    pub damage_type: String,
    pub timestamp: DateTime<Utc>,
    /// Set once the property management has dealt with the report.
    pub checked: bool,
}

impl Model for DamageReport {
    const KIND: EntityKind = EntityKind::DamageReport;
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "deployment",
        "message",
        "name",
        "contact",
        "damage_type",
        "timestamp",
        "checked",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deployment: row.get(1)?,
            message: row.get(2)?,
            name: row.get(3)?,
            contact: row.get(4)?,
            damage_type: row.get(5)?,
            timestamp: row.get(6)?,
            checked: row.get(7)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Parameters for filing a damage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDamageReport {
    pub message: String,
    pub name: String,
    pub damage_type: String,
    pub contact: Option<String>,
}

impl NewDamageReport {
    /// Reads a report as submitted by a device.
    ///
    /// `message`, `name` and `damage_type` must be strings; `contact` is
    /// optional and ignored unless it is a string.
    pub fn from_json(value: &Value) -> Result<Self, OrmError> {
        let required = |key: &'static str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(OrmError::MissingField(key))
        };

        Ok(Self {
            message: required("message")?,
            name: required("name")?,
            damage_type: required("damage_type")?,
            contact: value
                .get("contact")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

impl DamageReport {
    /// Files a report for the deployment.
    pub fn add(conn: &Connection, deployment: i64, new: &NewDamageReport) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO damage_report (deployment, message, name, contact, damage_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                deployment,
                new.message,
                new.name,
                new.contact,
                new.damage_type,
                Utc::now(),
            ],
        )
    }

    /// Files a report from its JSON submission.
    pub fn from_json(conn: &Connection, deployment: i64, value: &Value) -> Result<Self, OrmError> {
        Self::add(conn, deployment, &NewDamageReport::from_json(value)?)
    }

    /// Sets the resolution status.
    pub fn mark_checked(&self, conn: &Connection, checked: bool) -> Result<Self, OrmError> {
        update_returning(
            conn,
            "UPDATE damage_report SET checked = ?1 WHERE id = ?2",
            params![checked, self.id],
        )?
        .ok_or(OrmError::NotFound {
            table: Self::table(),
            id: self.id,
        })
    }

    /// Returns the reports of a deployment, newest first.
    pub fn by_deployment(conn: &Connection, deployment: i64) -> Result<Vec<Self>, OrmError> {
        select_where(
            conn,
            "WHERE deployment = ?1 ORDER BY timestamp DESC, id DESC",
            [deployment],
        )
    }

    /// Returns all reports nobody has dealt with yet, oldest first.
    pub fn unchecked(conn: &Connection) -> Result<Vec<Self>, OrmError> {
        select_where(conn, "WHERE checked = 0 ORDER BY timestamp ASC, id ASC", [])
    }
}

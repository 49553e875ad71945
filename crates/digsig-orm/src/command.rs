//! Device commands.
//!
//! A command is dispatched to a virtual device (`vid`) of a customer and
//! picked up by the device agent, which marks it completed. Apart from the
//! completion timestamp a command is never modified.

use chrono::{DateTime, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::model::{insert_returning, select_first, select_where, update_returning, Model};

/// A task issued to a signage device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: i64,
    pub customer: i64,
    /// Virtual device identifier within the customer.
    pub vid: i64,
    /// Task name, at most 16 characters.
    pub task: String,
    pub created: DateTime<Utc>,
    pub completed: Option<DateTime<Utc>>,
}

impl Model for Command {
    const KIND: EntityKind = EntityKind::Command;
    const COLUMNS: &'static [&'static str] =
        &["id", "customer", "vid", "task", "created", "completed"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer: row.get(1)?,
            vid: row.get(2)?,
            task: row.get(3)?,
            created: row.get(4)?,
            completed: row.get(5)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Command {
    /// Issues `task` to the device, or returns the command already issued
    /// with the same customer, device and task.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Database` on SQL failure, including a constraint
    /// violation for an unknown customer or an over-long task name.
    pub fn add(conn: &Connection, customer: i64, vid: i64, task: &str) -> Result<Self, OrmError> {
        let existing: Option<Self> = select_first(
            conn,
            "WHERE customer = ?1 AND vid = ?2 AND task = ?3 ORDER BY id ASC",
            params![customer, vid, task],
        )?;
        if let Some(command) = existing {
            tracing::debug!(id = command.id, customer, vid, task, "command already issued");
            return Ok(command);
        }

        insert_returning(
            conn,
            "INSERT INTO command (customer, vid, task, created) VALUES (?1, ?2, ?3, ?4)",
            params![customer, vid, task, Utc::now()],
        )
    }

    /// Marks the command completed now.
    ///
    /// An already completed command keeps its original completion time
    /// unless `force` is set. Returns the command as stored afterwards.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::NotFound` if the command was deleted meanwhile.
    pub fn complete(&self, conn: &Connection, force: bool) -> Result<Self, OrmError> {
        if !force && self.completed.is_some() {
            return self.reload(conn);
        }

        update_returning(
            conn,
            "UPDATE command SET completed = ?1 WHERE id = ?2",
            params![Utc::now(), self.id],
        )?
        .ok_or(OrmError::NotFound {
            table: Self::table(),
            id: self.id,
        })
    }

    /// Returns the uncompleted commands of a device, oldest first.
    pub fn pending(conn: &Connection, customer: i64, vid: i64) -> Result<Vec<Self>, OrmError> {
        select_where(
            conn,
            "WHERE customer = ?1 AND vid = ?2 AND completed IS NULL ORDER BY created ASC, id ASC",
            params![customer, vid],
        )
    }

    /// Returns `true` once the device has completed the command.
    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }
}

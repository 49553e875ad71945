//! Cleaning chart: valet service accounts and the cleanings they log.
//!
//! A [`CleaningUser`] belongs to a customer and identifies with a four-digit
//! PIN on the device. Each logged cleaning is a [`CleaningDate`] at an
//! address, optionally carrying free-text [`CleaningAnnotation`]s which are
//! removed together with their cleaning date.

use chrono::{DateTime, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::OrmError;
use crate::model::{get, insert_returning, select_first, select_where, update_returning, Model};
use crate::parents::Address;

/// Account of a valet service employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningUser {
    pub id: i64,
    pub name: String,
    /// Free-form kind of employee (e.g. "caretaker").
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub customer: i64,
    pub pin: String,
    pub annotation: Option<String>,
    pub created: DateTime<Utc>,
    pub enabled: bool,
}

impl Model for CleaningUser {
    const KIND: EntityKind = EntityKind::CleaningUser;
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "type",
        "customer",
        "pin",
        "annotation",
        "created",
        "enabled",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            type_: row.get(2)?,
            customer: row.get(3)?,
            pin: row.get(4)?,
            annotation: row.get(5)?,
            created: row.get(6)?,
            enabled: row.get(7)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Parameters for creating a cleaning user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCleaningUser {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub customer: i64,
    pub pin: String,
    pub annotation: Option<String>,
    /// Accounts are disabled unless this is `Some(true)`.
    pub enabled: Option<bool>,
}

/// Parameters for updating a cleaning user. `None` leaves a field untouched.
///
/// The nullable columns take a nested option: `Some(None)` (JSON `null`)
/// clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCleaningUser {
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_: Option<Option<String>>,
    pub pin: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub annotation: Option<Option<String>>,
    pub enabled: Option<bool>,
}

/// Maps a key that is present, even as `null`, to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl CleaningUser {
    /// Creates a cleaning user.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::DuplicateUser` if the customer already has a user
    /// with this name, or `OrmError::Database` for constraint violations
    /// such as a PIN that is not four characters long.
    pub fn add(conn: &Connection, new: &NewCleaningUser) -> Result<Self, OrmError> {
        let existing: Option<Self> = select_first(
            conn,
            "WHERE name = ?1 AND customer = ?2",
            params![new.name, new.customer],
        )?;
        if existing.is_some() {
            return Err(OrmError::DuplicateUser {
                name: new.name.clone(),
                customer: new.customer,
            });
        }

        insert_returning(
            conn,
            "INSERT INTO cleaning_user (name, type, customer, pin, annotation, created, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                new.type_,
                new.customer,
                new.pin,
                new.annotation,
                Utc::now(),
                new.enabled.unwrap_or(false),
            ],
        )
    }

    /// Applies `updates` in a single statement and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::NotFound` if the user does not exist.
    pub fn update(conn: &Connection, id: i64, updates: &UpdateCleaningUser) -> Result<Self, OrmError> {
        let mut set_parts: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(name) = &updates.name {
            values.push(Box::new(name.clone()));
            set_parts.push(format!("name = ?{}", values.len()));
        }
        if let Some(type_) = &updates.type_ {
            values.push(Box::new(type_.clone()));
            set_parts.push(format!("type = ?{}", values.len()));
        }
        if let Some(pin) = &updates.pin {
            values.push(Box::new(pin.clone()));
            set_parts.push(format!("pin = ?{}", values.len()));
        }
        if let Some(annotation) = &updates.annotation {
            values.push(Box::new(annotation.clone()));
            set_parts.push(format!("annotation = ?{}", values.len()));
        }
        if let Some(enabled) = updates.enabled {
            values.push(Box::new(enabled));
            set_parts.push(format!("enabled = ?{}", values.len()));
        }

        if set_parts.is_empty() {
            return get(conn, id);
        }

        values.push(Box::new(id));
        let sql = format!(
            "UPDATE cleaning_user SET {} WHERE id = ?{}",
            set_parts.join(", "),
            values.len()
        );
        let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        update_returning(conn, &sql, params.as_slice())?.ok_or(OrmError::NotFound {
            table: Self::table(),
            id,
        })
    }

    /// Returns the customer's cleaning users ordered by name.
    pub fn by_customer(conn: &Connection, customer: i64) -> Result<Vec<Self>, OrmError> {
        select_where(conn, "WHERE customer = ?1 ORDER BY name ASC", [customer])
    }

    /// JSON representation.
    ///
    /// The short form is the bare name for users without a type and
    /// `{"name", "type"}` otherwise; the long form is the whole record.
    /// Timestamps are rendered as RFC 3339.
    pub fn to_json(&self, short: bool) -> Result<Value, OrmError> {
        if !short {
            let mut value = serde_json::to_value(self)?;
            value["created"] = json!(self.created.to_rfc3339());
            return Ok(value);
        }

        Ok(match &self.type_ {
            None => Value::String(self.name.clone()),
            Some(type_) => json!({ "name": self.name, "type": type_ }),
        })
    }
}

/// One logged cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningDate {
    pub id: i64,
    pub user: i64,
    pub address: i64,
    pub deployment: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl Model for CleaningDate {
    const KIND: EntityKind = EntityKind::CleaningDate;
    const COLUMNS: &'static [&'static str] = &["id", "user", "address", "deployment", "timestamp"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user: row.get(1)?,
            address: row.get(2)?,
            deployment: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl CleaningDate {
    /// Logs a cleaning by `user` at `address` now, together with its
    /// annotations, in one transaction.
    pub fn add<S: AsRef<str>>(
        conn: &Connection,
        user: i64,
        address: i64,
        deployment: Option<i64>,
        annotations: &[S],
    ) -> Result<Self, OrmError> {
        let tx = conn.unchecked_transaction()?;
        let cleaning: Self = insert_returning(
            &tx,
            "INSERT INTO cleaning_date (user, address, deployment, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![user, address, deployment, Utc::now()],
        )?;

        for text in annotations {
            CleaningAnnotation::add(&tx, cleaning.id, text.as_ref())?;
        }

        tx.commit()?;
        Ok(cleaning)
    }

    /// Returns the cleanings at an address, newest first, at most `limit` rows.
    pub fn by_address(
        conn: &Connection,
        address: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Self>, OrmError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        select_where(
            conn,
            "WHERE address = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
            params![address, limit],
        )
    }

    /// Returns the annotations of this cleaning in insertion order.
    pub fn annotations(&self, conn: &Connection) -> Result<Vec<CleaningAnnotation>, OrmError> {
        select_where(conn, "WHERE cleaning_date = ?1 ORDER BY id ASC", [self.id])
    }

    /// JSON representation with the user and annotations resolved.
    ///
    /// The short form holds the timestamp, the user's short form and the
    /// annotation texts. The long form is the whole record with the user and
    /// the address (without its id) nested.
    pub fn to_json(&self, conn: &Connection, short: bool) -> Result<Value, OrmError> {
        let user: CleaningUser = get(conn, self.user)?;
        let annotations: Vec<String> = self
            .annotations(conn)?
            .into_iter()
            .map(|annotation| annotation.text)
            .collect();

        if short {
            return Ok(json!({
                "timestamp": self.timestamp.to_rfc3339(),
                "user": user.to_json(true)?,
                "annotations": annotations,
            }));
        }

        let address: Address = get(conn, self.address)?;
        let mut value = serde_json::to_value(self)?;
        value["timestamp"] = json!(self.timestamp.to_rfc3339());
        value["user"] = user.to_json(false)?;
        value["address"] = address.to_json_without_id();
        value["annotations"] = json!(annotations);
        Ok(value)
    }
}

/// Free text attached to a cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningAnnotation {
    pub id: i64,
    pub cleaning_date: i64,
    pub text: String,
}

impl Model for CleaningAnnotation {
    const KIND: EntityKind = EntityKind::CleaningAnnotation;
    const COLUMNS: &'static [&'static str] = &["id", "cleaning_date", "text"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            cleaning_date: row.get(1)?,
            text: row.get(2)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl CleaningAnnotation {
    /// Attaches an annotation to a cleaning.
    pub fn add(conn: &Connection, cleaning_date: i64, text: &str) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO cleaning_annotation (cleaning_date, text) VALUES (?1, ?2)",
            params![cleaning_date, text],
        )
    }
}

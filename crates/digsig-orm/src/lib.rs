//! Record definitions for the digital signage database.
//!
//! Declares the records the signage system keeps outside its content
//! management: device commands, usage statistics, cleaning charts,
//! tenant-to-tenant messages, damage reports and allowed proxy hosts, plus
//! the minimal parent records (customers, addresses, deployments) they
//! reference.
//!
//! Every record type implements [`Model`], so the generic [`get`], [`find`],
//! [`list`], [`count`] and [`delete`] functions work for all of them.
//! Record-specific operations are inherent methods on each type. All
//! functions take a `&rusqlite::Connection`; pooling and schema creation are
//! provided by the `digsig-db` crate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use digsig_orm::{get, Command};
//!
//! let command = Command::add(&conn, customer_id, 12, "reboot")?;
//! let done = command.complete(&conn, false)?;
//! assert_eq!(get::<Command>(&conn, done.id)?, done);
//! ```
//!
//! Constraint violations (unknown parents, over-long values, duplicate
//! unique keys) are reported by SQLite and passed through as
//! [`OrmError::Database`]; use [`OrmError::is_constraint_violation`] to
//! detect them.

mod cleaning;
mod command;
mod damage_report;
mod error;
mod maintenance;
mod model;
mod parents;
mod proxy_host;
mod statistics;
mod tenant_message;

pub use cleaning::{
    CleaningAnnotation, CleaningDate, CleaningUser, NewCleaningUser, UpdateCleaningUser,
};
pub use command::Command;
pub use damage_report::{DamageReport, NewDamageReport};
pub use error::OrmError;
pub use maintenance::{
    check_statistics, refresh_termstats, RefreshReport, StatsCheck, DEFAULT_RETENTION_DAYS,
};
pub use model::{count, delete, find, get, list, Model};
pub use parents::{Address, Customer, Deployment};
pub use proxy_host::ProxyHost;
pub use statistics::{LatestStats, Statistics};
pub use tenant_message::TenantMessage;

#[cfg(test)]
mod test_support;

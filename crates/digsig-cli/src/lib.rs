//! The `digsigdb` maintenance tool.
//!
//! Applies schema migrations, refreshes the latest-statistics table,
//! checks statistics freshness for monitoring and manages the proxy host
//! allow list.

pub mod config;

use std::io::Write;

use chrono::Utc;
use clap::{Parser, Subcommand};
use digsig_db::{MigrationError, PoolError};
use digsig_orm::{OrmError, ProxyHost};
use digsig_types::{InvalidDays, StatsThresholds, MAX_DAYS};
use rusqlite::Connection;
use thiserror::Error;

use crate::config::{Config, ConfigError, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "digsigdb", about = "Digital signage database maintenance", version)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, env = "DIGSIGDB_CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Check how recently a deployment reported statistics.
    Chkstats {
        /// Deployment ID.
        deployment: i64,
        /// Days after which to warn.
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
        warning: Option<i64>,
        /// Days after which the state is critical.
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
        critical: Option<i64>,
    },
    /// Truncate old statistics and rebuild the latest-statistics table.
    RefreshStats {
        /// Remove statistics older than this many days.
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
        truncate: Option<i64>,
    },
    /// Manage the proxy host allow list.
    Proxy {
        #[command(subcommand)]
        action: ProxyAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProxyAction {
    /// List allowed hosts.
    List,
    /// Allow a host.
    Add { hostname: String },
    /// Disallow a host.
    Remove { hostname: String },
}

/// Errors that abort a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Orm(#[from] OrmError),

    #[error("invalid statistics threshold: {0}")]
    Threshold(#[from] InvalidDays),

    #[error("no such proxy host: {0}")]
    UnknownHost(String),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Opens the configured database, applies pending migrations and runs the
/// command, writing its report to `out`.
///
/// Returns the process exit code.
pub fn run(command: &Command, config: &Config, out: &mut impl Write) -> Result<i32, CliError> {
    let pool = digsig_db::create_pool(&config.database.path, config.database.runtime_settings())?;
    let conn = pool.get().map_err(PoolError::PoolInit)?;
    let applied = digsig_db::run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "applied database migrations");
    }

    match command {
        Command::Migrate => {
            writeln!(out, "Applied {applied} migration(s).")?;
            Ok(0)
        }
        Command::Chkstats {
            deployment,
            warning,
            critical,
        } => {
            let thresholds = StatsThresholds::from_days(
                warning.unwrap_or(config.statistics.warning_days),
                critical.unwrap_or(config.statistics.critical_days),
            )?;
            chkstats(&conn, *deployment, &thresholds, out)
        }
        Command::RefreshStats { truncate } => {
            let days = truncate.unwrap_or(config.statistics.retention_days);
            let report = digsig_orm::refresh_termstats(&conn, days)?;
            tracing::info!(
                truncated = report.truncated,
                deployments = report.deployments,
                "refreshed latest statistics"
            );
            Ok(0)
        }
        Command::Proxy { action } => proxy(&conn, action, out),
    }
}

fn chkstats(
    conn: &Connection,
    deployment: i64,
    thresholds: &StatsThresholds,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let check = digsig_orm::check_statistics(conn, deployment, thresholds, Utc::now())?;
    writeln!(out, "{check}")?;
    Ok(check.status.exit_code())
}

fn proxy(conn: &Connection, action: &ProxyAction, out: &mut impl Write) -> Result<i32, CliError> {
    match action {
        ProxyAction::List => {
            for host in ProxyHost::all(conn)? {
                writeln!(out, "{}", host.hostname)?;
            }
        }
        ProxyAction::Add { hostname } => {
            let host = ProxyHost::add(conn, hostname)?;
            tracing::info!(id = host.id, hostname = %host.hostname, "allowed proxy host");
        }
        ProxyAction::Remove { hostname } => {
            let host = ProxyHost::by_hostname(conn, hostname)?
                .ok_or_else(|| CliError::UnknownHost(hostname.clone()))?;
            digsig_orm::delete::<ProxyHost>(conn, host.id)?;
            tracing::info!(id = host.id, hostname = %host.hostname, "removed proxy host");
        }
    }
    Ok(0)
}

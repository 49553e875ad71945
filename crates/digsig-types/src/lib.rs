//! Shared types for the digital signage database.
//!
//! This crate holds the small value types used by more than one crate in
//! the workspace: the catalogue of record kinds and the statistics
//! health-check classification.
//!
//! It has no database dependency, so the CLI and the ORM layer can both
//! depend on it without pulling in each other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod check;
pub use check::{days, CheckStatus, InvalidDays, StatsThresholds, MAX_DAYS};

/// Every record kind declared by the schema.
///
/// The first three are parent records (tenant/site concept) referenced by
/// foreign keys; the remaining ones are the signage records proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A tenant/customer organisation.
    Customer,
    /// A site address.
    Address,
    /// An installed signage device.
    Deployment,
    /// A device instruction.
    Command,
    /// A usage statistics sample.
    Statistics,
    /// Pointer to the newest statistics sample per deployment.
    LatestStats,
    /// A valet service employee account.
    CleaningUser,
    /// A cleaning chart entry.
    CleaningDate,
    /// Free text attached to a cleaning chart entry.
    CleaningAnnotation,
    /// A tenant-to-tenant message.
    TenantMessage,
    /// A reported physical damage incident.
    DamageReport,
    /// An allowed application proxy host.
    ProxyHost,
}

impl EntityKind {
    /// All kinds in schema creation order.
    pub const ALL: [EntityKind; 12] = [
        Self::Customer,
        Self::Address,
        Self::Deployment,
        Self::Command,
        Self::Statistics,
        Self::LatestStats,
        Self::CleaningUser,
        Self::CleaningDate,
        Self::CleaningAnnotation,
        Self::TenantMessage,
        Self::DamageReport,
        Self::ProxyHost,
    ];

    /// Returns the name of the table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Address => "address",
            Self::Deployment => "deployment",
            Self::Command => "command",
            Self::Statistics => "statistics",
            Self::LatestStats => "latest_stats",
            Self::CleaningUser => "cleaning_user",
            Self::CleaningDate => "cleaning_date",
            Self::CleaningAnnotation => "cleaning_annotation",
            Self::TenantMessage => "tenant_message",
            Self::DamageReport => "damage_report",
            Self::ProxyHost => "proxy_hosts",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.table() == s)
            .ok_or_else(|| ParseEntityKindError(s.to_string()))
    }
}

/// Error returned when parsing an unknown table name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity kind: {0}")]
pub struct ParseEntityKindError(pub String);

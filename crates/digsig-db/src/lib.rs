//! Database layer for the digital signage records.
//!
//! Provides SQLite connection pooling (via `r2d2`), per-connection pragmas
//! (WAL journaling, enforced foreign keys, busy timeout) and the embedded,
//! ordered SQL migrations that create every table the ORM layer maps.
//!
//! Query execution, locking and isolation belong to SQLite itself; this
//! crate only opens and configures connections.

mod migrations;
mod pool;

pub use migrations::{applied_migrations, run_migrations, MigrationError};
pub use pool::{
    configure_connection, create_pool, open_in_memory, DbPool, DbRuntimeSettings, PoolError,
    PooledConnection,
};

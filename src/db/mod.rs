//! Database layer
//!
//! Storage for accounts, blog articles and the mailing list. Two backends
//! are supported behind the [`DatabasePool`] trait:
//! - SQLite (default, a single file next to the binary)
//! - MySQL
//!
//! Repositories receive a [`DynDatabasePool`] and branch on
//! [`DatabasePool::driver`] for the few statements whose syntax differs.

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// True when the error chain carries a UNIQUE constraint violation.
///
/// Used by services to turn a lost insert race into a conflict instead of an
/// internal error.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    })
}

/// Borrow the SQLite pool, failing instead of panicking on a driver mismatch.
pub(crate) fn sqlite(pool: &DynDatabasePool) -> anyhow::Result<&sqlx::SqlitePool> {
    pool.as_sqlite()
        .ok_or_else(|| anyhow::anyhow!("database pool is not SQLite"))
}

/// Borrow the MySQL pool, failing instead of panicking on a driver mismatch.
pub(crate) fn mysql(pool: &DynDatabasePool) -> anyhow::Result<&sqlx::MySqlPool> {
    pool.as_mysql()
        .ok_or_else(|| anyhow::anyhow!("database pool is not MySQL"))
}

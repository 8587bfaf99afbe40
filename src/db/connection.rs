// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - No hidden connection creation
// - Clear error propagation
// - Thread-safe access

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Get the database file path
///
/// Database is stored in the application data directory.
/// Path structure: {APP_DATA}/mangavault/mangavault.db
pub fn get_database_path() -> AppResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

    let vault_dir = app_data_dir.join("mangavault");

    // Ensure directory exists
    std::fs::create_dir_all(&vault_dir).map_err(AppError::Io)?;

    Ok(vault_dir.join("mangavault.db"))
}

/// Create a connection pool at the default application data path.
///
/// The configuration collaborator that owns path settings may instead call
/// `create_pool_at` with an explicit location and swap the handle it passes
/// to the repositories; nothing in this crate reaches for global state.
pub fn create_connection_pool() -> AppResult<ConnectionPool> {
    let db_path = get_database_path()?;
    create_pool_at(&db_path)
}

/// Create a connection pool for an explicit database file.
///
/// Pool configuration:
/// - Max 15 connections (reasonable for desktop app)
/// - SQLite in WAL mode for better concurrency
/// - Foreign keys enabled
/// - Busy timeout set to avoid immediate errors
pub fn create_pool_at(db_path: &Path) -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        // Enable foreign key support (not default in SQLite)
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(15)
        .build(manager)
        .map_err(|e| AppError::Other(format!("Failed to create connection pool: {}", e)))?;

    Ok(pool)
}

/// Create an in-memory pool (for testing)
///
/// Capped at a single connection so every caller shares the one in-memory
/// database; a second concurrent checkout would deadlock, which the
/// sequential test flow never does.
#[cfg(test)]
pub(crate) fn create_test_pool() -> ConnectionPool {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("in-memory pool");

    crate::db::migrations::initialize_database(&pool.get().expect("test connection"))
        .expect("test schema");

    pool
}

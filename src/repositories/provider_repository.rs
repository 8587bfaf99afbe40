// src/repositories/provider_repository.rs
//
// Providers are static reference data seeded by the schema; this repository
// only reads them.

use std::sync::Arc;

use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::Provider;
use crate::error::{AppError, AppResult};

pub trait ProviderRepository: Send + Sync {
    fn list_all(&self) -> AppResult<Vec<Provider>>;
    fn get_by_name(&self, name: &str) -> AppResult<Option<Provider>>;
}

pub struct SqliteProviderRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteProviderRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_provider(row: &Row) -> Result<Provider, rusqlite::Error> {
        Ok(Provider {
            id: row.get("id")?,
            name: row.get("name")?,
            language: row.get("language")?,
        })
    }
}

impl ProviderRepository for SqliteProviderRepository {
    fn list_all(&self) -> AppResult<Vec<Provider>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name, language FROM providers ORDER BY name")?;

        let providers = stmt
            .query_map([], Self::row_to_provider)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(providers)
    }

    fn get_by_name(&self, name: &str) -> AppResult<Option<Provider>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name, language FROM providers WHERE name = ?1")?;

        match stmt.query_row(params![name], Self::row_to_provider) {
            Ok(provider) => Ok(Some(provider)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

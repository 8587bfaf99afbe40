// src/repositories/contributor_repository.rs

use std::sync::Arc;

use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::Contributor;
use crate::error::{AppError, AppResult};

pub trait ContributorRepository: Send + Sync {
    fn list_all(&self) -> AppResult<Vec<Contributor>>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Contributor>>;
}

pub struct SqliteContributorRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteContributorRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_contributor(row: &Row) -> Result<Contributor, rusqlite::Error> {
        Ok(Contributor {
            id: row.get("id")?,
            name: row.get("name")?,
            work_count: row.get("work_count")?,
        })
    }
}

impl ContributorRepository for SqliteContributorRepository {
    fn list_all(&self) -> AppResult<Vec<Contributor>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare("SELECT id, name, work_count FROM contributors ORDER BY name")?;

        let contributors = stmt
            .query_map([], Self::row_to_contributor)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(contributors)
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Contributor>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare("SELECT id, name, work_count FROM contributors WHERE id = ?1")?;

        match stmt.query_row(params![id], Self::row_to_contributor) {
            Ok(contributor) => Ok(Some(contributor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

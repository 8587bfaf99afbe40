// src/repositories/tag_repository.rs

use std::sync::Arc;

use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::Tag;
use crate::error::{AppError, AppResult};

pub trait TagRepository: Send + Sync {
    fn list_all(&self) -> AppResult<Vec<Tag>>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Tag>>;
}

pub struct SqliteTagRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteTagRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_tag(row: &Row) -> Result<Tag, rusqlite::Error> {
        Ok(Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            work_count: row.get("work_count")?,
        })
    }
}

impl TagRepository for SqliteTagRepository {
    fn list_all(&self) -> AppResult<Vec<Tag>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name, work_count FROM tags ORDER BY name")?;

        let tags = stmt
            .query_map([], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Tag>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name, work_count FROM tags WHERE id = ?1")?;

        match stmt.query_row(params![id], Self::row_to_tag) {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

// src/repositories/collection_repository.rs

use std::sync::Arc;

use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::{Collection, NewCollection};
use crate::error::{AppError, AppResult};
use crate::repositories::reconciler::{find_or_create, EntityKind};

pub trait CollectionRepository: Send + Sync {
    /// Find-or-create by name; a second create of the same name returns the
    /// existing row instead of failing.
    fn create(&self, new: &NewCollection) -> AppResult<Collection>;
    fn list_all(&self) -> AppResult<Vec<Collection>>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Collection>>;
}

pub struct SqliteCollectionRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteCollectionRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_collection(row: &Row) -> Result<Collection, rusqlite::Error> {
        Ok(Collection {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

impl CollectionRepository for SqliteCollectionRepository {
    fn create(&self, new: &NewCollection) -> AppResult<Collection> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let id = find_or_create(&tx, EntityKind::Collection, &new.name)?;
        tx.commit()?;

        Ok(Collection {
            id,
            name: new.name.clone(),
        })
    }

    fn list_all(&self) -> AppResult<Vec<Collection>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name FROM collections ORDER BY name")?;

        let collections = stmt
            .query_map([], Self::row_to_collection)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collections)
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Collection>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, name FROM collections WHERE id = ?1")?;

        match stmt.query_row(params![id], Self::row_to_collection) {
            Ok(collection) => Ok(Some(collection)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

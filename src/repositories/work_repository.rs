// src/repositories/work_repository.rs
//
// Work aggregate persistence.
//
// Every public mutation runs inside a single transaction: sub-entity
// reconciliation, link replacement, volume replacement and counter
// recomputation commit together or not at all. Covers reaching this layer
// are already local filenames (or absent); URL resolution happens in the
// cover asset manager before any transaction is opened.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::db::ConnectionPool;
use crate::domain::{
    Category, Collection, Contributor, NewVolume, NewWork, PublicationStatus, ReadingStatus, Tag,
    Volume, Work,
};
use crate::error::{AppError, AppResult};
use crate::repositories::reconciler::{find_or_create, EntityKind};

/// Reserved search marker: `list:<name>` filters by collection membership
/// instead of by title substring.
pub const COLLECTION_FILTER_PREFIX: &str = "list:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Pagination / filter parameters for `query`.
#[derive(Debug, Clone)]
pub struct WorkQuery {
    pub skip: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort: SortDirection,
}

impl Default for WorkQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 10,
            search: None,
            sort: SortDirection::Ascending,
        }
    }
}

pub trait WorkRepository: Send + Sync {
    fn create(&self, new: &NewWork) -> AppResult<Work>;
    fn create_batch(&self, batch: &[NewWork]) -> AppResult<Vec<Work>>;
    fn update(&self, id: i64, input: &NewWork) -> AppResult<Work>;
    fn delete(&self, id: i64) -> AppResult<Work>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Work>>;
    fn get_by_title(&self, title: &str, language: Option<&str>) -> AppResult<Option<Work>>;
    fn query(&self, query: &WorkQuery) -> AppResult<Vec<Work>>;
    fn list_by_contributor(&self, contributor_id: i64) -> AppResult<Vec<Work>>;
    fn list_by_tag(&self, tag_id: i64) -> AppResult<Vec<Work>>;
    fn list_by_collection(&self, collection_id: i64) -> AppResult<Vec<Work>>;
    fn list_by_rating(&self, rating: f64) -> AppResult<Vec<Work>>;
}

pub struct SqliteWorkRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteWorkRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Map a works row to a Work with empty sub-entity lists.
    /// Returns rusqlite::Error for query_map compatibility.
    fn row_to_work(row: &Row) -> Result<Work, rusqlite::Error> {
        let reading_status = row
            .get::<_, Option<String>>("reading_status")?
            .map(|s| ReadingStatus::from_str(&s))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let publication_status = row
            .get::<_, Option<String>>("publication_status")?
            .map(|s| PublicationStatus::from_str(&s))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let category_str: String = row.get("category")?;
        let category = Category::from_str(&category_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let created_at = DateTime::parse_from_rfc3339(&row.get::<_, String>("created_at")?)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let updated_at = DateTime::parse_from_rfc3339(&row.get::<_, String>("updated_at")?)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        Ok(Work {
            id: row.get("id")?,
            title: row.get("title")?,
            native_title: row.get("native_title")?,
            reading_status,
            publication_status,
            star_rating: row.get("star_rating")?,
            language: row.get("language")?,
            category,
            summary: row.get("summary")?,
            cover: row.get("cover")?,
            contributors: Vec::new(),
            tags: Vec::new(),
            collections: Vec::new(),
            volumes: Vec::new(),
            created_at,
            updated_at,
        })
    }

    /// Attach the full sub-entity set to a scalar Work.
    fn hydrate(conn: &Connection, mut work: Work) -> AppResult<Work> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.work_count
             FROM contributors c
             JOIN work_contributors wc ON wc.contributor_id = c.id
             WHERE wc.work_id = ?1
             ORDER BY c.name",
        )?;
        work.contributors = stmt
            .query_map(params![work.id], |row| {
                Ok(Contributor {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    work_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.work_count
             FROM tags t
             JOIN work_tags wt ON wt.tag_id = t.id
             WHERE wt.work_id = ?1
             ORDER BY t.name",
        )?;
        work.tags = stmt
            .query_map(params![work.id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    work_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT c.id, c.name
             FROM collections c
             JOIN work_collections wc ON wc.collection_id = c.id
             WHERE wc.work_id = ?1
             ORDER BY c.name",
        )?;
        work.collections = stmt
            .query_map(params![work.id], |row| {
                Ok(Collection {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, work_id, label, cover FROM volumes WHERE work_id = ?1 ORDER BY id",
        )?;
        work.volumes = stmt
            .query_map(params![work.id], |row| {
                Ok(Volume {
                    id: row.get(0)?,
                    work_id: row.get(1)?,
                    label: row.get(2)?,
                    cover: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(work)
    }

    fn load_aggregate(conn: &Connection, id: i64) -> AppResult<Option<Work>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, native_title, reading_status, publication_status,
                    star_rating, language, category, summary, cover,
                    created_at, updated_at
             FROM works WHERE id = ?1",
        )?;

        let work = match stmt.query_row(params![id], Self::row_to_work) {
            Ok(work) => work,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(AppError::Database(e)),
        };

        Self::hydrate(conn, work).map(Some)
    }

    /// Hydrate every scalar Work produced by a filter query.
    fn load_matching(conn: &Connection, works: Vec<Work>) -> AppResult<Vec<Work>> {
        works
            .into_iter()
            .map(|work| Self::hydrate(conn, work))
            .collect()
    }

    /// Reconcile `names` against existing rows and link them to the work.
    /// Returns the resolved row ids (duplicates collapse onto one id).
    fn link_entities(
        tx: &Transaction<'_>,
        work_id: i64,
        kind: EntityKind,
        names: &[String],
    ) -> AppResult<Vec<i64>> {
        let link_sql = match kind {
            EntityKind::Contributor => {
                "INSERT OR IGNORE INTO work_contributors (work_id, contributor_id) VALUES (?1, ?2)"
            }
            EntityKind::Tag => "INSERT OR IGNORE INTO work_tags (work_id, tag_id) VALUES (?1, ?2)",
            EntityKind::Collection => {
                "INSERT OR IGNORE INTO work_collections (work_id, collection_id) VALUES (?1, ?2)"
            }
        };

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = find_or_create(tx, kind, name)?;
            tx.execute(link_sql, params![work_id, id])?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn insert_volumes(tx: &Transaction<'_>, work_id: i64, volumes: &[NewVolume]) -> AppResult<()> {
        for volume in volumes {
            tx.execute(
                "INSERT INTO volumes (work_id, label, cover) VALUES (?1, ?2, ?3)",
                params![work_id, volume.label, volume.cover],
            )?;
        }
        Ok(())
    }

    fn linked_ids(tx: &Transaction<'_>, sql: &str, work_id: i64) -> AppResult<Vec<i64>> {
        let mut stmt = tx.prepare(sql)?;
        let ids = stmt
            .query_map(params![work_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Set each contributor/tag counter to the live number of linking works.
    /// Runs inside the mutating transaction so counters and links commit
    /// together.
    fn recompute_counts(
        tx: &Transaction<'_>,
        kind: EntityKind,
        ids: impl IntoIterator<Item = i64>,
    ) -> AppResult<()> {
        let sql = match kind {
            EntityKind::Contributor => {
                "UPDATE contributors
                 SET work_count = (SELECT COUNT(*) FROM work_contributors WHERE contributor_id = ?1)
                 WHERE id = ?1"
            }
            EntityKind::Tag => {
                "UPDATE tags
                 SET work_count = (SELECT COUNT(*) FROM work_tags WHERE tag_id = ?1)
                 WHERE id = ?1"
            }
            // Collections carry no counter
            EntityKind::Collection => return Ok(()),
        };

        for id in ids.into_iter().collect::<BTreeSet<_>>() {
            tx.execute(sql, params![id])?;
        }
        Ok(())
    }

    /// Insert one work aggregate inside the given transaction.
    ///
    /// The duplicate check runs against the same transaction, so later batch
    /// members see earlier ones.
    fn insert_work_tx(tx: &Transaction<'_>, new: &NewWork) -> AppResult<i64> {
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM works WHERE title = ?1 AND language IS ?2",
                params![new.title, new.language],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(AppError::DuplicateWork {
                title: new.title.clone(),
            });
        }

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO works (title, native_title, reading_status, publication_status,
                                star_rating, language, category, summary, cover,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                new.title,
                new.native_title,
                new.reading_status.map(|s| s.as_str()),
                new.publication_status.map(|s| s.as_str()),
                new.star_rating,
                new.language,
                new.category.as_str(),
                new.summary,
                new.cover,
                now,
                now,
            ],
        )?;
        let work_id = tx.last_insert_rowid();

        let contributor_names: Vec<String> =
            new.contributors.iter().map(|c| c.name.clone()).collect();
        let tag_names: Vec<String> = new.tags.iter().map(|t| t.name.clone()).collect();
        let collection_names: Vec<String> =
            new.collections.iter().map(|c| c.name.clone()).collect();

        let contributor_ids =
            Self::link_entities(tx, work_id, EntityKind::Contributor, &contributor_names)?;
        let tag_ids = Self::link_entities(tx, work_id, EntityKind::Tag, &tag_names)?;
        Self::link_entities(tx, work_id, EntityKind::Collection, &collection_names)?;

        Self::insert_volumes(tx, work_id, &new.volumes)?;

        Self::recompute_counts(tx, EntityKind::Contributor, contributor_ids)?;
        Self::recompute_counts(tx, EntityKind::Tag, tag_ids)?;

        Ok(work_id)
    }

    fn filter_works(&self, sql: &str, param: impl rusqlite::ToSql) -> AppResult<Vec<Work>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let works = stmt
            .query_map(params![param], Self::row_to_work)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        Self::load_matching(&conn, works)
    }
}

impl WorkRepository for SqliteWorkRepository {
    fn create(&self, new: &NewWork) -> AppResult<Work> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let work_id = Self::insert_work_tx(&tx, new)?;
        let work = Self::load_aggregate(&tx, work_id)?.ok_or(AppError::NotFound)?;

        tx.commit()?;
        Ok(work)
    }

    fn create_batch(&self, batch: &[NewWork]) -> AppResult<Vec<Work>> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let mut ids = Vec::with_capacity(batch.len());
        for new in batch {
            ids.push(Self::insert_work_tx(&tx, new)?);
        }

        let mut works = Vec::with_capacity(ids.len());
        for id in ids {
            works.push(Self::load_aggregate(&tx, id)?.ok_or(AppError::NotFound)?);
        }

        tx.commit()?;
        Ok(works)
    }

    fn update(&self, id: i64, input: &NewWork) -> AppResult<Work> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let old_contributors = Self::linked_ids(
            &tx,
            "SELECT contributor_id FROM work_contributors WHERE work_id = ?1",
            id,
        )?;
        let old_tags = Self::linked_ids(&tx, "SELECT tag_id FROM work_tags WHERE work_id = ?1", id)?;

        let now = Utc::now().to_rfc3339();
        let affected = tx.execute(
            "UPDATE works
             SET title = ?1, native_title = ?2, reading_status = ?3, publication_status = ?4,
                 star_rating = ?5, language = ?6, category = ?7, summary = ?8, cover = ?9,
                 updated_at = ?10
             WHERE id = ?11",
            params![
                input.title,
                input.native_title,
                input.reading_status.map(|s| s.as_str()),
                input.publication_status.map(|s| s.as_str()),
                input.star_rating,
                input.language,
                input.category.as_str(),
                input.summary,
                input.cover,
                now,
                id,
            ],
        )?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        // Full replace: links removed from the input are unlinked, volumes are
        // rebuilt from scratch.
        tx.execute("DELETE FROM work_contributors WHERE work_id = ?1", params![id])?;
        tx.execute("DELETE FROM work_tags WHERE work_id = ?1", params![id])?;
        tx.execute("DELETE FROM work_collections WHERE work_id = ?1", params![id])?;
        tx.execute("DELETE FROM volumes WHERE work_id = ?1", params![id])?;

        let contributor_names: Vec<String> =
            input.contributors.iter().map(|c| c.name.clone()).collect();
        let tag_names: Vec<String> = input.tags.iter().map(|t| t.name.clone()).collect();
        let collection_names: Vec<String> =
            input.collections.iter().map(|c| c.name.clone()).collect();

        let new_contributors =
            Self::link_entities(&tx, id, EntityKind::Contributor, &contributor_names)?;
        let new_tags = Self::link_entities(&tx, id, EntityKind::Tag, &tag_names)?;
        Self::link_entities(&tx, id, EntityKind::Collection, &collection_names)?;
        Self::insert_volumes(&tx, id, &input.volumes)?;

        // Union of previous and current links, so entities that lost their
        // last reference land on zero instead of going stale.
        Self::recompute_counts(
            &tx,
            EntityKind::Contributor,
            old_contributors.into_iter().chain(new_contributors),
        )?;
        Self::recompute_counts(&tx, EntityKind::Tag, old_tags.into_iter().chain(new_tags))?;

        let work = Self::load_aggregate(&tx, id)?.ok_or(AppError::NotFound)?;
        tx.commit()?;
        Ok(work)
    }

    fn delete(&self, id: i64) -> AppResult<Work> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let work = Self::load_aggregate(&tx, id)?.ok_or(AppError::NotFound)?;

        let old_contributors = Self::linked_ids(
            &tx,
            "SELECT contributor_id FROM work_contributors WHERE work_id = ?1",
            id,
        )?;
        let old_tags = Self::linked_ids(&tx, "SELECT tag_id FROM work_tags WHERE work_id = ?1", id)?;

        // Links and volumes cascade with the work row
        tx.execute("DELETE FROM works WHERE id = ?1", params![id])?;

        Self::recompute_counts(&tx, EntityKind::Contributor, old_contributors)?;
        Self::recompute_counts(&tx, EntityKind::Tag, old_tags)?;

        tx.commit()?;
        Ok(work)
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Work>> {
        let conn = self.pool.get()?;
        Self::load_aggregate(&conn, id)
    }

    fn get_by_title(&self, title: &str, language: Option<&str>) -> AppResult<Option<Work>> {
        let conn = self.pool.get()?;

        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM works WHERE title = ?1 AND language IS ?2",
                params![title, language],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => Self::load_aggregate(&conn, id),
            None => Ok(None),
        }
    }

    fn query(&self, query: &WorkQuery) -> AppResult<Vec<Work>> {
        let conn = self.pool.get()?;
        let direction = query.sort.sql();

        let works = match query.search.as_deref() {
            Some(search) if search.starts_with(COLLECTION_FILTER_PREFIX) => {
                let name = search[COLLECTION_FILTER_PREFIX.len()..].trim();
                let sql = format!(
                    "SELECT w.id, w.title, w.native_title, w.reading_status, w.publication_status,
                            w.star_rating, w.language, w.category, w.summary, w.cover,
                            w.created_at, w.updated_at
                     FROM works w
                     JOIN work_collections wc ON wc.work_id = w.id
                     JOIN collections c ON c.id = wc.collection_id
                     WHERE c.name = ?1
                     ORDER BY w.title COLLATE NOCASE {direction}
                     LIMIT ?2 OFFSET ?3"
                );
                let mut stmt = conn.prepare(&sql)?;
                let works = stmt
                    .query_map(
                        params![name, query.limit as i64, query.skip as i64],
                        Self::row_to_work,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                works
            }
            Some(search) => {
                // LIKE is case-insensitive for ASCII in SQLite
                let sql = format!(
                    "SELECT id, title, native_title, reading_status, publication_status,
                            star_rating, language, category, summary, cover,
                            created_at, updated_at
                     FROM works
                     WHERE title LIKE ?1
                     ORDER BY title COLLATE NOCASE {direction}
                     LIMIT ?2 OFFSET ?3"
                );
                let pattern = format!("%{}%", search);
                let mut stmt = conn.prepare(&sql)?;
                let works = stmt
                    .query_map(
                        params![pattern, query.limit as i64, query.skip as i64],
                        Self::row_to_work,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                works
            }
            None => {
                let sql = format!(
                    "SELECT id, title, native_title, reading_status, publication_status,
                            star_rating, language, category, summary, cover,
                            created_at, updated_at
                     FROM works
                     ORDER BY title COLLATE NOCASE {direction}
                     LIMIT ?1 OFFSET ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let works = stmt
                    .query_map(
                        params![query.limit as i64, query.skip as i64],
                        Self::row_to_work,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                works
            }
        };

        Self::load_matching(&conn, works)
    }

    fn list_by_contributor(&self, contributor_id: i64) -> AppResult<Vec<Work>> {
        self.filter_works(
            "SELECT w.id, w.title, w.native_title, w.reading_status, w.publication_status,
                    w.star_rating, w.language, w.category, w.summary, w.cover,
                    w.created_at, w.updated_at
             FROM works w
             JOIN work_contributors wc ON wc.work_id = w.id
             WHERE wc.contributor_id = ?1",
            contributor_id,
        )
    }

    fn list_by_tag(&self, tag_id: i64) -> AppResult<Vec<Work>> {
        self.filter_works(
            "SELECT w.id, w.title, w.native_title, w.reading_status, w.publication_status,
                    w.star_rating, w.language, w.category, w.summary, w.cover,
                    w.created_at, w.updated_at
             FROM works w
             JOIN work_tags wt ON wt.work_id = w.id
             WHERE wt.tag_id = ?1",
            tag_id,
        )
    }

    fn list_by_collection(&self, collection_id: i64) -> AppResult<Vec<Work>> {
        self.filter_works(
            "SELECT w.id, w.title, w.native_title, w.reading_status, w.publication_status,
                    w.star_rating, w.language, w.category, w.summary, w.cover,
                    w.created_at, w.updated_at
             FROM works w
             JOIN work_collections wc ON wc.work_id = w.id
             WHERE wc.collection_id = ?1",
            collection_id,
        )
    }

    fn list_by_rating(&self, rating: f64) -> AppResult<Vec<Work>> {
        self.filter_works(
            "SELECT id, title, native_title, reading_status, publication_status,
                    star_rating, language, category, summary, cover,
                    created_at, updated_at
             FROM works
             WHERE star_rating = ?1",
            rating,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::{NewCollection, NewContributor, NewTag, NewVolume};

    fn repo() -> (SqliteWorkRepository, Arc<ConnectionPool>) {
        let pool = Arc::new(create_test_pool());
        (SqliteWorkRepository::new(pool.clone()), pool)
    }

    fn scalar(pool: &ConnectionPool, sql: &str) -> i64 {
        pool.get()
            .unwrap()
            .query_row(sql, [], |row| row.get(0))
            .unwrap()
    }

    fn naruto() -> NewWork {
        let mut new = NewWork::new("Naruto", Category::Manga);
        new.language = Some("EN".to_string());
        new.contributors = vec![NewContributor::new("Kishimoto")];
        new.tags = vec![NewTag::new("Action")];
        new
    }

    #[test]
    fn test_create_links_and_counts_sub_entities() {
        let (repo, _pool) = repo();

        let work = repo.create(&naruto()).unwrap();

        assert_eq!(work.title, "Naruto");
        assert_eq!(work.language.as_deref(), Some("EN"));
        assert_eq!(work.category, Category::Manga);
        assert_eq!(work.contributors.len(), 1);
        assert_eq!(work.contributors[0].name, "Kishimoto");
        assert_eq!(work.contributors[0].work_count, 1);
        assert_eq!(work.tags.len(), 1);
        assert_eq!(work.tags[0].name, "Action");
        assert_eq!(work.tags[0].work_count, 1);
        assert!(work.volumes.is_empty());

        // A by-id read returns the same aggregate
        let reloaded = repo.get_by_id(work.id).unwrap().unwrap();
        assert_eq!(reloaded.title, work.title);
        assert_eq!(reloaded.contributors[0].name, "Kishimoto");
    }

    #[test]
    fn test_create_duplicate_rejected_without_mutation() {
        let (repo, pool) = repo();
        repo.create(&naruto()).unwrap();

        let mut dup = naruto();
        dup.tags = vec![NewTag::new("Adventure")];
        let err = repo.create(&dup).unwrap_err();
        assert!(matches!(err, AppError::DuplicateWork { .. }));

        // Nothing from the failed attempt leaked into the store
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM works"), 1);
        assert_eq!(
            scalar(&pool, "SELECT COUNT(*) FROM tags WHERE name = 'Adventure'"),
            0
        );
        assert_eq!(
            scalar(&pool, "SELECT work_count FROM contributors WHERE name = 'Kishimoto'"),
            1
        );
    }

    #[test]
    fn test_same_title_distinct_language() {
        let (repo, _pool) = repo();
        repo.create(&naruto()).unwrap();

        let mut german = naruto();
        german.language = Some("DE".to_string());
        repo.create(&german).unwrap();

        let english = repo.get_by_title("Naruto", Some("EN")).unwrap().unwrap();
        assert_eq!(english.language.as_deref(), Some("EN"));

        assert!(repo.get_by_title("Naruto", Some("FR")).unwrap().is_none());
    }

    #[test]
    fn test_shared_contributor_counts_both_works() {
        let (repo, pool) = repo();
        repo.create(&naruto()).unwrap();

        let mut boruto = NewWork::new("Boruto", Category::Manga);
        boruto.language = Some("EN".to_string());
        boruto.contributors = vec![NewContributor::new("Kishimoto")];
        repo.create(&boruto).unwrap();

        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM contributors"), 1);
        assert_eq!(
            scalar(&pool, "SELECT work_count FROM contributors WHERE name = 'Kishimoto'"),
            2
        );
    }

    #[test]
    fn test_duplicate_names_within_one_create_collapse() {
        let (repo, pool) = repo();

        let mut new = naruto();
        new.tags = vec![NewTag::new("Action"), NewTag::new("Action")];
        let work = repo.create(&new).unwrap();

        assert_eq!(work.tags.len(), 1);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM tags"), 1);
        assert_eq!(work.tags[0].work_count, 1);
    }

    #[test]
    fn test_update_replaces_links_and_zeroes_counts() {
        let (repo, pool) = repo();

        let mut new = naruto();
        new.tags = vec![NewTag::new("Horror")];
        let work = repo.create(&new).unwrap();

        let mut input = naruto();
        input.tags = vec![];
        input.star_rating = Some(4.5);
        let updated = repo.update(work.id, &input).unwrap();

        assert!(updated.tags.is_empty());
        assert_eq!(updated.star_rating, Some(4.5));

        // The tag row survives at count zero
        assert_eq!(
            scalar(&pool, "SELECT COUNT(*) FROM tags WHERE name = 'Horror'"),
            1
        );
        assert_eq!(
            scalar(&pool, "SELECT work_count FROM tags WHERE name = 'Horror'"),
            0
        );
    }

    #[test]
    fn test_update_fully_replaces_volumes() {
        let (repo, pool) = repo();

        let mut new = naruto();
        new.volumes = vec![NewVolume::new("1"), NewVolume::new("2")];
        let work = repo.create(&new).unwrap();
        assert_eq!(work.volumes.len(), 2);

        let mut input = naruto();
        input.volumes = vec![NewVolume::new("0"), NewVolume::new("13.5")];
        let updated = repo.update(work.id, &input).unwrap();

        let labels: Vec<&str> = updated.volumes.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "13.5"]);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM volumes"), 2);
    }

    #[test]
    fn test_update_missing_id() {
        let (repo, _pool) = repo();
        let err = repo.update(42, &naruto()).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn test_delete_cascades_volumes_and_recomputes() {
        let (repo, pool) = repo();

        let mut new = naruto();
        new.volumes = vec![NewVolume::new("1")];
        let work = repo.create(&new).unwrap();

        let deleted = repo.delete(work.id).unwrap();
        assert_eq!(deleted.id, work.id);

        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM works"), 0);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM volumes"), 0);
        assert_eq!(
            scalar(&pool, "SELECT work_count FROM contributors WHERE name = 'Kishimoto'"),
            0
        );

        let err = repo.delete(work.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn test_create_batch_is_atomic() {
        let (repo, pool) = repo();

        // Second member duplicates the first: the whole batch must roll back
        let err = repo.create_batch(&[naruto(), naruto()]).unwrap_err();
        assert!(matches!(err, AppError::DuplicateWork { .. }));

        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM works"), 0);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM contributors"), 0);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM tags"), 0);

        let mut boruto = NewWork::new("Boruto", Category::Manga);
        boruto.language = Some("EN".to_string());
        let works = repo.create_batch(&[naruto(), boruto]).unwrap();
        assert_eq!(works.len(), 2);
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM works"), 2);
    }

    #[test]
    fn test_query_search_sort_and_pagination() {
        let (repo, _pool) = repo();
        for title in ["Akira", "Berserk", "Bakuman", "Monster"] {
            let mut new = NewWork::new(title, Category::Manga);
            new.language = Some("EN".to_string());
            repo.create(&new).unwrap();
        }

        // Case-insensitive substring match on title
        let hits = repo
            .query(&WorkQuery {
                search: Some("bA".to_string()),
                ..WorkQuery::default()
            })
            .unwrap();
        let titles: Vec<&str> = hits.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Bakuman"]);

        // Descending sort
        let all = repo
            .query(&WorkQuery {
                sort: SortDirection::Descending,
                ..WorkQuery::default()
            })
            .unwrap();
        let titles: Vec<&str> = all.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Monster", "Berserk", "Bakuman", "Akira"]);

        // Pagination
        let page = repo
            .query(&WorkQuery {
                skip: 1,
                limit: 2,
                ..WorkQuery::default()
            })
            .unwrap();
        let titles: Vec<&str> = page.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Bakuman", "Berserk"]);
    }

    #[test]
    fn test_query_collection_filter_prefix() {
        let (repo, _pool) = repo();

        let mut favorite = NewWork::new("Berserk", Category::Manga);
        favorite.collections = vec![NewCollection::new("Favorites")];
        repo.create(&favorite).unwrap();
        repo.create(&NewWork::new("Akira", Category::Manga)).unwrap();

        let hits = repo
            .query(&WorkQuery {
                search: Some("list:Favorites".to_string()),
                ..WorkQuery::default()
            })
            .unwrap();
        let titles: Vec<&str> = hits.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Berserk"]);

        // Unknown collection name matches nothing
        let none = repo
            .query(&WorkQuery {
                search: Some("list:Archive".to_string()),
                ..WorkQuery::default()
            })
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_relation_lookups() {
        let (repo, _pool) = repo();
        let work = repo.create(&naruto()).unwrap();

        let mut rated = NewWork::new("Monster", Category::Manga);
        rated.star_rating = Some(5.0);
        repo.create(&rated).unwrap();

        let by_contributor = repo
            .list_by_contributor(work.contributors[0].id)
            .unwrap();
        assert_eq!(by_contributor.len(), 1);
        assert_eq!(by_contributor[0].title, "Naruto");

        let by_tag = repo.list_by_tag(work.tags[0].id).unwrap();
        assert_eq!(by_tag.len(), 1);

        let by_rating = repo.list_by_rating(5.0).unwrap();
        assert_eq!(by_rating.len(), 1);
        assert_eq!(by_rating[0].title, "Monster");
    }
}

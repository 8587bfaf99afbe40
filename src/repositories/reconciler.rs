// src/repositories/reconciler.rs
//
// Find-or-create deduplication for named sub-entities.
//
// Runs against the caller's open transaction so that repeated calls for the
// same name inside one operation observe each other's inserts (read-your-writes)
// and can never produce two rows for one name. Cross-operation races are
// backstopped by the UNIQUE(name) constraints in the schema.

use rusqlite::{params, OptionalExtension, Transaction};

use crate::error::AppResult;

/// The kinds of named entities the reconciler manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Contributor,
    Tag,
    Collection,
}

impl EntityKind {
    fn select_sql(&self) -> &'static str {
        match self {
            EntityKind::Contributor => "SELECT id FROM contributors WHERE name = ?1",
            EntityKind::Tag => "SELECT id FROM tags WHERE name = ?1",
            EntityKind::Collection => "SELECT id FROM collections WHERE name = ?1",
        }
    }

    fn insert_sql(&self) -> &'static str {
        // work_count starts at its schema default of zero; the catalog
        // repository recomputes it once links are in place.
        match self {
            EntityKind::Contributor => "INSERT INTO contributors (name) VALUES (?1)",
            EntityKind::Tag => "INSERT INTO tags (name) VALUES (?1)",
            EntityKind::Collection => "INSERT INTO collections (name) VALUES (?1)",
        }
    }
}

/// Resolve `name` to an existing row of the given kind, creating one if
/// absent. Lookup is by exact (case-sensitive) name match.
pub fn find_or_create(tx: &Transaction<'_>, kind: EntityKind, name: &str) -> AppResult<i64> {
    let existing: Option<i64> = tx
        .query_row(kind.select_sql(), params![name], |row| row.get(0))
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(kind.insert_sql(), params![name])?;
    Ok(tx.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::initialize_database;
    use rusqlite::Connection;

    fn test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        initialize_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_second_call_reuses_first_insert() {
        let mut conn = test_connection();
        let tx = conn.transaction().unwrap();

        let first = find_or_create(&tx, EntityKind::Contributor, "Kentaro Miura").unwrap();
        let second = find_or_create(&tx, EntityKind::Contributor, "Kentaro Miura").unwrap();
        assert_eq!(first, second);

        tx.commit().unwrap();

        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM contributors WHERE name = 'Kentaro Miura'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let mut conn = test_connection();
        let tx = conn.transaction().unwrap();

        let lower = find_or_create(&tx, EntityKind::Tag, "horror").unwrap();
        let upper = find_or_create(&tx, EntityKind::Tag, "Horror").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_kinds_do_not_share_rows() {
        let mut conn = test_connection();
        let tx = conn.transaction().unwrap();

        find_or_create(&tx, EntityKind::Tag, "Seinen").unwrap();
        find_or_create(&tx, EntityKind::Collection, "Seinen").unwrap();
        tx.commit().unwrap();

        let tags: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        let collections: i64 = conn
            .query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))
            .unwrap();
        assert_eq!((tags, collections), (1, 1));
    }

    #[test]
    fn test_new_rows_start_with_zero_count() {
        let mut conn = test_connection();
        let tx = conn.transaction().unwrap();
        find_or_create(&tx, EntityKind::Contributor, "Naoki Urasawa").unwrap();
        tx.commit().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT work_count FROM contributors WHERE name = 'Naoki Urasawa'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}

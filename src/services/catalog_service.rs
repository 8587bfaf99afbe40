// src/services/catalog_service.rs
//
// Catalog orchestration.
//
// This is the entry point the routing layer calls for work mutations. The
// service owns the ordering rules the repository cannot see: invariant
// validation, cover resolution (network I/O strictly before the store
// transaction opens), release of replaced cover files, and cleanup of
// freshly downloaded covers when a create ultimately fails.

use std::sync::Arc;

use crate::covers::{is_remote_reference, CoverManager};
use crate::domain::{validate_new_work, NewWork, Work};
use crate::error::{AppError, AppResult};
use crate::repositories::{WorkQuery, WorkRepository};

pub struct CatalogService {
    works: Arc<dyn WorkRepository>,
    covers: Arc<CoverManager>,
}

impl CatalogService {
    pub fn new(works: Arc<dyn WorkRepository>, covers: Arc<CoverManager>) -> Self {
        Self { works, covers }
    }

    pub async fn create(&self, new: NewWork) -> AppResult<Work> {
        validate_new_work(&new).map_err(AppError::Domain)?;

        if self
            .works
            .get_by_title(&new.title, new.language.as_deref())?
            .is_some()
        {
            return Err(AppError::DuplicateWork { title: new.title });
        }

        let (record, downloaded) = self.resolve_cover(new).await;

        match self.works.create(&record) {
            Ok(work) => Ok(work),
            Err(e) => {
                // Don't leave a just-downloaded cover orphaned in the store
                if let Some(name) = downloaded.as_deref() {
                    self.covers.release(name);
                }
                Err(e)
            }
        }
    }

    /// All-or-nothing: covers are resolved up front, then every member is
    /// persisted in one transaction. On failure the repository rolls the
    /// batch back and any covers downloaded for it are released.
    pub async fn create_batch(&self, batch: Vec<NewWork>) -> AppResult<Vec<Work>> {
        for new in &batch {
            validate_new_work(new).map_err(AppError::Domain)?;
        }

        let mut prepared = Vec::with_capacity(batch.len());
        let mut downloaded = Vec::new();
        for new in batch {
            let (record, fresh) = self.resolve_cover(new).await;
            downloaded.extend(fresh);
            prepared.push(record);
        }

        match self.works.create_batch(&prepared) {
            Ok(works) => Ok(works),
            Err(e) => {
                for name in &downloaded {
                    self.covers.release(name);
                }
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: i64, input: NewWork) -> AppResult<Work> {
        validate_new_work(&input).map_err(AppError::Domain)?;

        let existing = self.works.get_by_id(id)?.ok_or(AppError::NotFound)?;

        let mut record = input;
        if record.cover != existing.cover {
            // The reference changed: the old file is released first, then the
            // incoming reference is resolved exactly like on create.
            if let Some(old) = existing.cover.as_deref() {
                self.covers.release(old);
            }
            let resolved = self.covers.resolve(record.cover.as_deref()).await;
            record.cover = resolved;
        }

        self.works.update(id, &record)
    }

    pub fn delete(&self, id: i64) -> AppResult<Work> {
        let existing = self.works.get_by_id(id)?.ok_or(AppError::NotFound)?;

        if let Some(cover) = existing.cover.as_deref() {
            self.covers.release(cover);
        }

        self.works.delete(id)
    }

    pub fn get(&self, id: i64) -> AppResult<Option<Work>> {
        self.works.get_by_id(id)
    }

    pub fn get_by_title(&self, title: &str, language: Option<&str>) -> AppResult<Option<Work>> {
        self.works.get_by_title(title, language)
    }

    pub fn query(&self, query: &WorkQuery) -> AppResult<Vec<Work>> {
        self.works.query(query)
    }

    pub fn list_by_contributor(&self, contributor_id: i64) -> AppResult<Vec<Work>> {
        self.works.list_by_contributor(contributor_id)
    }

    pub fn list_by_tag(&self, tag_id: i64) -> AppResult<Vec<Work>> {
        self.works.list_by_tag(tag_id)
    }

    pub fn list_by_collection(&self, collection_id: i64) -> AppResult<Vec<Work>> {
        self.works.list_by_collection(collection_id)
    }

    pub fn list_by_rating(&self, rating: f64) -> AppResult<Vec<Work>> {
        self.works.list_by_rating(rating)
    }

    /// Resolve the cover reference before any transaction opens. Returns the
    /// record with its final cover plus the filename when the cover was
    /// freshly downloaded (so failure paths can release it again).
    async fn resolve_cover(&self, mut new: NewWork) -> (NewWork, Option<String>) {
        let was_remote = new.cover.as_deref().is_some_and(is_remote_reference);
        let resolved = self.covers.resolve(new.cover.as_deref()).await;

        let downloaded = if was_remote { resolved.clone() } else { None };
        new.cover = resolved;
        (new, downloaded)
    }
}

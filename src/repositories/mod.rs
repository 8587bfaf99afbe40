// src/repositories/mod.rs
//
// Persistence layer - one repository per aggregate/entity

pub mod collection_repository;
pub mod contributor_repository;
pub mod provider_repository;
pub mod reconciler;
pub mod tag_repository;
pub mod work_repository;

pub use collection_repository::{CollectionRepository, SqliteCollectionRepository};
pub use contributor_repository::{ContributorRepository, SqliteContributorRepository};
pub use provider_repository::{ProviderRepository, SqliteProviderRepository};
pub use reconciler::{find_or_create, EntityKind};
pub use tag_repository::{SqliteTagRepository, TagRepository};
pub use work_repository::{
    SortDirection, SqliteWorkRepository, WorkQuery, WorkRepository, COLLECTION_FILTER_PREFIX,
};

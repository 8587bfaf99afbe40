// src/lib.rs
// MangaVault - catalog reconciliation and multi-source ingestion engine
//
// Architecture:
// - Domain-centric: canonical record shapes and invariants live in `domain`
// - Explicit: repositories persist whole aggregates in one transaction,
//   services own operation ordering, nothing reaches for global state
// - Providers are adapters behind a static name registry; they only map
//   external payloads into the canonical create shape
// - Cover artwork goes through the asset manager, never straight to disk

pub mod covers;
pub mod db;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;
pub mod sources;

// ============================================================================
// PUBLIC API - Canonical Record Model
// ============================================================================

pub use domain::{
    validate_new_work,
    // Work
    Category,
    // Collection
    Collection,
    // Contributor
    Contributor,
    NewCollection,
    NewContributor,
    NewTag,
    NewVolume,
    NewWork,
    // Provider reference data
    Provider,
    PublicationStatus,
    ReadingStatus,
    // Tag
    Tag,
    // Volume records
    Volume,
    Work,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Persistence & Orchestration
// ============================================================================

pub use db::{create_connection_pool, create_pool_at, initialize_database, ConnectionPool};

pub use repositories::{
    CollectionRepository, ContributorRepository, ProviderRepository, SortDirection,
    SqliteCollectionRepository, SqliteContributorRepository, SqliteProviderRepository,
    SqliteTagRepository, SqliteWorkRepository, TagRepository, WorkQuery, WorkRepository,
    COLLECTION_FILTER_PREFIX,
};

pub use services::CatalogService;

// ============================================================================
// PUBLIC API - Covers & Providers
// ============================================================================

pub use covers::{CoverManager, CoverStore, FsCoverStore};

pub use sources::{
    JikanAdapter, MangaPassionAdapter, PageRenderer, SourceAdapter, SourceRegistry,
};

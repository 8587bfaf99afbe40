// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`.

pub mod collection;
pub mod contributor;
pub mod provider;
pub mod tag;
pub mod volume;
pub mod work;

// Work Domain
pub use work::{
    validate_new_work, Category, NewWork, PublicationStatus, ReadingStatus, Work,
};

// Named sub-entities (reconciled by name)
pub use collection::{Collection, NewCollection};
pub use contributor::{Contributor, NewContributor};
pub use tag::{NewTag, Tag};

// Volume records (owned by a Work)
pub use volume::{NewVolume, Volume};

// Provider reference data
pub use provider::Provider;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unrecognized {kind} value '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

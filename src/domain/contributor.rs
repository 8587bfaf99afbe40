// src/domain/contributor.rs

use serde::{Deserialize, Serialize};

/// A person credited on one or more works (author or artist, unified
/// regardless of role). Names are unique; rows are shared across works
/// through the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: i64,
    pub name: String,

    /// Number of works currently linking this contributor.
    /// Recomputed by the catalog repository after every link change.
    pub work_count: i64,
}

/// Name-only create shape, as produced by adapters and direct entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContributor {
    pub name: String,
}

impl NewContributor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

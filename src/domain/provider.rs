// src/domain/provider.rs

use serde::{Deserialize, Serialize};

/// A registered external content provider. Static reference data seeded by
/// the schema; the matching adapter is registered in `sources::SourceRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub language: String,
}

// src/domain/tag.rs

use serde::{Deserialize, Serialize};

/// A classification label (genre, theme or demographic) attached to works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,

    /// Number of works currently linking this tag.
    pub work_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

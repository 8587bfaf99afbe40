// src/domain/volume.rs

use serde::{Deserialize, Serialize};

/// A per-volume record owned exclusively by its Work. Labels are strings so
/// that values like "0" or "13.5" survive unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: i64,
    pub work_id: i64,
    pub label: String,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVolume {
    pub label: String,
    pub cover: Option<String>,
}

impl NewVolume {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cover: None,
        }
    }
}

// src/domain/work/mod.rs

mod entity;
mod invariants;

pub use entity::{Category, NewWork, PublicationStatus, ReadingStatus, Work};
pub use invariants::validate_new_work;

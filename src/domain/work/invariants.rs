use super::entity::NewWork;
use crate::domain::{DomainError, DomainResult};

/// Validates all invariants of an incoming Work shape.
/// These are the absolute rules that must hold before a Work may be persisted.
pub fn validate_new_work(work: &NewWork) -> DomainResult<()> {
    validate_title(&work.title)?;
    validate_star_rating(work.star_rating)?;
    Ok(())
}

/// Title cannot be empty
fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Work title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Star rating, when present, must lie in the inclusive range 1–5
fn validate_star_rating(rating: Option<f64>) -> DomainResult<()> {
    if let Some(value) = rating {
        if !(1.0..=5.0).contains(&value) {
            return Err(DomainError::InvariantViolation(format!(
                "Star rating {} outside the 1-5 range",
                value
            )));
        }
    }
    Ok(())
}

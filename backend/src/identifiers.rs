//! Generation of system keys (`ApplicationID`).
//!
//! Candidates are random v4 UUIDs checked against the store before use. The
//! check is only a pre-filter: two concurrent creations can both see a value
//! as free, so the store's UNIQUE constraint on `application_id` remains the
//! real guard. The retry loop is bounded; running out of attempts means the
//! existence check is broken, not that the id space is full.

use crate::error::{ApiError, AppResult};
use uuid::Uuid;

pub const MAX_ID_ATTEMPTS: usize = 8;

/// Returns the first random identifier for which `is_taken` reports false.
pub fn generate_unique<F>(is_taken: F) -> AppResult<String>
where
    F: FnMut(&str) -> AppResult<bool>,
{
    generate_unique_with(|| Uuid::new_v4().to_string(), is_taken)
}

pub(crate) fn generate_unique_with<N, F>(mut next: N, mut is_taken: F) -> AppResult<String>
where
    N: FnMut() -> String,
    F: FnMut(&str) -> AppResult<bool>,
{
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = next();
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
        log::warn!("generated identifier collided (attempt {})", attempt);
    }
    Err(ApiError::Internal(format!(
        "no free identifier after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

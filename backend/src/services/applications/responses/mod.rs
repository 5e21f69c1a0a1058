//! Survey entries nested in an application's `Response` array.
//!
//! Entries have no life of their own: `add` appends one to an existing record
//! and `remove` drops one by its `_id`. Each operation is a single store call,
//! so the caller sees either the old or the new array, never a partial one.

pub(super) mod add;
pub(super) mod remove;

use actix_web::web::{delete, post};
use actix_web::Scope;

/// Adds the response routes to the applications scope.
pub(super) fn register(scope: Scope) -> Scope {
    scope
        .route("/{consumer_id}/responses", post().to(add::process))
        .route(
            "/{consumer_id}/responses/{response_id}",
            delete().to(remove::process),
        )
}

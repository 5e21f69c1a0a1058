pub mod applications;

use crate::error::ApiError;
use actix_web::web;

/// JSON extractor settings shared by every route: a body limit large enough
/// for base64 photos, and malformed bodies answered with the API's JSON
/// error shape instead of actix's plain-text default.
pub fn json_config(limit_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit_bytes)
        .error_handler(|err, _req| ApiError::ValidationFailed(err.to_string()).into())
}

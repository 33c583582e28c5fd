/// Request extractors whose rejections render as [`ApiError`]

use axum::extract::FromRequest;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// `Json<T>` with the API error body on malformed input
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Parses a path segment as a UUID, naming the field on failure
pub fn parse_id(field: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::ValidationError(vec![coursehub_shared::error::FieldError::new(
            field,
            "must be a valid UUID",
        )])
    })
}

// Utility functions
pub mod error;

pub use error::*;

use mongodb::bson::oid::ObjectId;

/// Parses a path id. Ids that cannot exist are reported as missing entities.
pub fn parse_object_id(raw: &str, entity: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", entity)))
}

/// Trimmed, non-empty string or `None`.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

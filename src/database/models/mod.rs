use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::error::ApiError;

pub mod aco;
pub mod organization;
pub mod program;
pub mod saving;
pub mod user;
pub mod workshop;

pub use aco::Aco;
pub use organization::{Organization, OrganizationDetail};
pub use program::Program;
pub use saving::Saving;
pub use user::User;
pub use workshop::Workshop;

/// Build a 400 naming every missing required field.
/// Each entry is (wire field name, is-missing).
pub(crate) fn missing_fields(checks: &[(&str, bool)]) -> ApiError {
    let field_errors: HashMap<String, String> = checks
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(field, _)| ((*field).to_string(), "This field is required".to_string()))
        .collect();
    ApiError::validation_error("Missing required fields", Some(field_errors))
}

/// Deserialize into `Some(value)` so an `Option<Option<T>>` payload field can
/// tell "absent" (None) apart from "explicitly null" (Some(None)). Partial
/// updates use this to clear nullable columns.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

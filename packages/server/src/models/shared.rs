use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::pipeline::ordering::MAX_SORT_ORDER;

/// Longest accepted alt text, in characters.
pub const MAX_ALT_TEXT_CHARS: usize = 500;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate optional alt text (at most 500 Unicode characters).
pub fn validate_alt_text(alt_text: Option<&str>) -> Result<(), AppError> {
    if let Some(text) = alt_text
        && text.trim().chars().count() > MAX_ALT_TEXT_CHARS
    {
        return Err(AppError::Validation(format!(
            "Alt text must be at most {MAX_ALT_TEXT_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validate an optional sort order (`0..=MAX_SORT_ORDER` when present).
pub fn validate_optional_sort_order(sort_order: Option<i32>) -> Result<(), AppError> {
    if let Some(sort_order) = sort_order
        && !(0..=MAX_SORT_ORDER).contains(&sort_order)
    {
        return Err(AppError::Validation(format!(
            "Sort order must be between 0 and {MAX_SORT_ORDER}"
        )));
    }
    Ok(())
}

use stockroom_core::{DomainError, DomainResult};

/// Column width of natural keys (sku, location code).
pub(crate) const KEY_MAX_LEN: usize = 64;
/// Column width of display names.
pub(crate) const NAME_MAX_LEN: usize = 200;

/// Trim a required text input and enforce a length cap.
pub(crate) fn required(field: &'static str, value: &str, max_len: usize) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::validation(
            field,
            format!("{field} cannot exceed {max_len} characters"),
        ));
    }
    Ok(value.to_string())
}

/// Trim optional free text; blank input is stored as absent.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

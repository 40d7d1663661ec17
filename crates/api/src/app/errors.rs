use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::DomainError;
use stockroom_infra::store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Storage(msg) => {
            tracing::error!(error = %msg, "ledger store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, .. } => validation_error(field, message),
        DomainError::DuplicateKey { .. } => json_error(StatusCode::CONFLICT, "duplicate_key", message),
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 carrying the name of the offending input.
pub fn validation_error(field: &str, message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": message.into(),
            "field": field,
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

/// Map a body the `Json` extractor refused onto the JSON error shape.
///
/// Type and missing-field errors become `validation_error` naming the field
/// serde reported; unparsable JSON is `invalid_body`.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    let text = rejection.body_text();
    let detail = text
        .split_once("target type: ")
        .map_or(text.as_str(), |(_, rest)| rest)
        .to_string();

    match rejection {
        JsonRejection::JsonDataError(_) => match rejected_field(&detail) {
            Some(field) => validation_error(&field, detail),
            None => json_error(StatusCode::BAD_REQUEST, "invalid_body", detail),
        },
        JsonRejection::MissingJsonContentType(_) => {
            json_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type", detail)
        }
        _ => json_error(StatusCode::BAD_REQUEST, "invalid_body", detail),
    }
}

/// Field named by a serde data error, e.g. ``missing field `qty` `` or
/// `qty: invalid type: ...`.
fn rejected_field(detail: &str) -> Option<String> {
    if let Some((_, rest)) = detail.split_once("missing field `") {
        return rest.split('`').next().map(str::to_string);
    }
    let (path, _) = detail.split_once(": ")?;
    (!path.is_empty() && !path.contains(char::is_whitespace)).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_messages_name_their_field() {
        assert_eq!(
            rejected_field("missing field `product_id` at line 1 column 11"),
            Some("product_id".to_string())
        );
        assert_eq!(
            rejected_field("qty: invalid type: string \"5\", expected i64 at line 1 column 29"),
            Some("qty".to_string())
        );
        assert_eq!(rejected_field("invalid type: sequence, expected struct MovementRequest"), None);
    }
}

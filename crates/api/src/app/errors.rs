//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use vestry_core::DomainError;
use vestry_infra::RepositoryError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    json_body(
        status,
        json!({
            "error": code,
            "message": message.into(),
        }),
    )
}

pub fn json_body(status: StatusCode, body: serde_json::Value) -> axum::response::Response {
    (status, axum::Json(body)).into_response()
}

/// Administrative/CRUD handlers surface store outcomes unchanged.
pub fn repository_error_response(err: RepositoryError) -> axum::response::Response {
    match err {
        RepositoryError::NotFound(entity) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{entity} not found"))
        }
        RepositoryError::DuplicateName(name) => {
            json_error(StatusCode::CONFLICT, "duplicate_name", format!("'{name}' already exists"))
        }
        RepositoryError::AlreadyAssigned => json_error(
            StatusCode::CONFLICT,
            "already_assigned",
            "role is already assigned to this identity",
        ),
        RepositoryError::Unavailable(msg) => {
            tracing::error!(error = %msg, "storage unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
        }
    }
}

pub fn domain_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

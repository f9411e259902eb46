use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use vestry_auth::EffectivePermissions;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::identity::CurrentIdentity;
use crate::registry::RequirementRegistry;

pub async fn health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// What the caller's credential resolves to right now: held roles and the
/// effective permission set, straight off the ledger.
pub async fn whoami(
    Extension(services): Extension<AppServices>,
    Extension(current): Extension<CurrentIdentity>,
) -> Response {
    let held = match services.resolver.assigned_roles(current.id).await {
        Ok(roles) => roles,
        Err(e) => return errors::repository_error_response(e),
    };
    let effective = EffectivePermissions::resolve(held.iter().map(|r| &r.permissions));
    let role_names: Vec<&str> = held.iter().map(|r| r.name.as_str()).collect();

    (
        StatusCode::OK,
        Json(json!({
            "identity_id": current.id,
            "role_hint": current.role_hint,
            "roles": role_names,
            "effective": dto::effective_to_json(&effective),
        })),
    )
        .into_response()
}

/// Audit listing of every registered operation and its requirements.
pub async fn operations(Extension(registry): Extension<Arc<RequirementRegistry>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "operations": registry.operations() })),
    )
        .into_response()
}

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use vestry_auth::{IdentityDraft, IdentityStatus};
use vestry_core::{IdentityId, RoleId};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_identity).get(list_identities))
        .route("/:id", get(get_identity))
        .route("/:id/activate", post(activate_identity))
        .route("/:id/deactivate", post(deactivate_identity))
        .route("/:id/roles", post(assign_role).get(list_assigned_roles))
        .route("/:id/roles/:role_id", delete(unassign_role))
        .route("/:id/permissions", get(effective_permissions))
}

pub async fn create_identity(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateIdentityRequest>,
) -> Response {
    let draft = match IdentityDraft::new(&body.email, &body.display_name) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.identities.create(draft).await {
        Ok(identity) => (StatusCode::CREATED, Json(identity)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_identities(Extension(services): Extension<AppServices>) -> Response {
    match services.identities.list().await {
        Ok(identities) => (StatusCode::OK, Json(json!({ "items": identities }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_identity(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: IdentityId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.identities.get(id).await {
        Ok(identity) => (StatusCode::OK, Json(identity)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn activate_identity(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    set_status(services, id, IdentityStatus::Active).await
}

/// Deactivation does not touch the ledger; the assignments lie dormant and
/// come back into force on reactivation.
pub async fn deactivate_identity(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    set_status(services, id, IdentityStatus::Inactive).await
}

async fn set_status(services: AppServices, raw_id: String, status: IdentityStatus) -> Response {
    let id: IdentityId = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.identities.set_status(id, status).await {
        Ok(identity) => (StatusCode::OK, Json(identity)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn assign_role(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignRoleRequest>,
) -> Response {
    let identity_id: IdentityId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role_id: RoleId = match parse_id(&body.role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.assignments.assign(identity_id, role_id).await {
        Ok(assignment) => (StatusCode::CREATED, Json(assignment)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn unassign_role(
    Extension(services): Extension<AppServices>,
    Path((id, role_id)): Path<(String, String)>,
) -> Response {
    let identity_id: IdentityId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role_id: RoleId = match parse_id(&role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.assignments.unassign(identity_id, role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_assigned_roles(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: IdentityId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.resolver.assigned_roles(id).await {
        Ok(roles) => (StatusCode::OK, Json(json!({ "items": roles }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

/// The merged permission view an administrator sees for an identity. Computed
/// from the live ledger, same as the gate would.
pub async fn effective_permissions(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: IdentityId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.resolver.effective_permissions(id).await {
        Ok(effective) => (
            StatusCode::OK,
            Json(json!({
                "identity_id": id,
                "effective": dto::effective_to_json(&effective),
            })),
        )
            .into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

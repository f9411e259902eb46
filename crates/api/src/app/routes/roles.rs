use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use vestry_auth::{RoleChanges, RoleDraft};
use vestry_core::RoleId;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_role).get(list_roles))
        .route("/:id", get(get_role).patch(update_role).delete(delete_role))
}

pub async fn create_role(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> Response {
    let draft = match RoleDraft::new(&body.name, body.description, body.permissions) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.roles.create(draft).await {
        Ok(role) => (StatusCode::CREATED, Json(role)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_roles(Extension(services): Extension<AppServices>) -> Response {
    match services.roles.list().await {
        Ok(roles) => (StatusCode::OK, Json(json!({ "items": roles }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_role(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.roles.get(id).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateRoleRequest>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let changes = match RoleChanges::new(body.name.as_deref(), body.description, body.permissions) {
        Ok(changes) => changes,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.roles.update(id, changes).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

/// Deletes the role and cascades through the assignment ledger; every holder
/// loses the role's grants at their next authorization check.
pub async fn delete_role(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.roles.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

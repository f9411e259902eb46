use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use vestry_core::ParishId;
use vestry_parish::{ParishChanges, ParishDraft};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_parish).get(list_parishes))
        .route("/:id", get(get_parish).patch(update_parish))
}

pub async fn create_parish(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateParishRequest>,
) -> Response {
    let draft = match ParishDraft::new(&body.name, body.address) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.parishes.create(draft).await {
        Ok(parish) => (StatusCode::CREATED, Json(parish)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_parishes(Extension(services): Extension<AppServices>) -> Response {
    match services.parishes.list().await {
        Ok(parishes) => (StatusCode::OK, Json(json!({ "items": parishes }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_parish(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: ParishId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.parishes.get(id).await {
        Ok(parish) => (StatusCode::OK, Json(parish)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn update_parish(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateParishRequest>,
) -> Response {
    let id: ParishId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let changes = match ParishChanges::new(body.name.as_deref(), body.address) {
        Ok(changes) => changes,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.parishes.update(id, changes).await {
        Ok(parish) => (StatusCode::OK, Json(parish)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

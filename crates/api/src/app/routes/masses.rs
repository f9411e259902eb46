use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use vestry_core::{MassId, ParishId};
use vestry_infra::MassFilter;
use vestry_parish::{MassChanges, MassDraft};

use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_mass).get(list_masses))
        .route("/:id", get(get_mass).patch(update_mass).delete(delete_mass))
}

pub async fn create_mass(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateMassRequest>,
) -> Response {
    let parish_id: ParishId = match parse_id(&body.parish_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let draft = match MassDraft::new(parish_id, body.scheduled_at, &body.celebrant, body.intention)
    {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.masses.create(draft).await {
        Ok(mass) => (StatusCode::CREATED, Json(mass)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_masses(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::MassListQuery>,
) -> Response {
    let parish_id = match parse_optional_id(query.parish_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let filter = MassFilter {
        parish_id,
        from: query.from,
        to: query.to,
    };
    match services.masses.list(filter).await {
        Ok(masses) => (StatusCode::OK, Json(json!({ "items": masses }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_mass(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: MassId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.masses.get(id).await {
        Ok(mass) => (StatusCode::OK, Json(mass)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn update_mass(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateMassRequest>,
) -> Response {
    let id: MassId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let changes =
        match MassChanges::new(body.scheduled_at, body.celebrant.as_deref(), body.intention) {
            Ok(changes) => changes,
            Err(e) => return errors::domain_error_response(e),
        };
    match services.masses.update(id, changes).await {
        Ok(mass) => (StatusCode::OK, Json(mass)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn delete_mass(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: MassId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.masses.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

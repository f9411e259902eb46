use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use vestry_core::{OfferingId, ParishId};
use vestry_finance::OfferingDraft;

use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_offering).get(list_offerings))
        .route("/:id", get(get_offering).delete(delete_offering))
}

pub async fn create_offering(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateOfferingRequest>,
) -> Response {
    let parish_id: ParishId = match parse_id(&body.parish_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mass_id = match parse_optional_id(body.mass_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let collected_at = body.collected_at.unwrap_or_else(Utc::now);
    let draft = match OfferingDraft::new(
        parish_id,
        mass_id,
        body.amount_cents,
        body.method,
        collected_at,
    ) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.offerings.create(draft).await {
        Ok(offering) => (StatusCode::CREATED, Json(offering)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_offerings(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::ParishScopedQuery>,
) -> Response {
    let parish_id = match parse_optional_id(query.parish_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.offerings.list(parish_id).await {
        Ok(offerings) => (StatusCode::OK, Json(json!({ "items": offerings }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_offering(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: OfferingId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.offerings.get(id).await {
        Ok(offering) => (StatusCode::OK, Json(offering)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

/// Removes a mistaken entry outright; offerings have no void state.
pub async fn delete_offering(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: OfferingId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.offerings.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

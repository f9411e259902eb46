use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use vestry_core::{ContributionId, ParishId};
use vestry_finance::ContributionDraft;

use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_contribution).get(list_contributions))
        .route("/:id", get(get_contribution))
}

pub async fn create_contribution(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreateContributionRequest>,
) -> Response {
    let parish_id: ParishId = match parse_id(&body.parish_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let contributed_at = body.contributed_at.unwrap_or_else(Utc::now);
    let draft = match ContributionDraft::new(
        parish_id,
        &body.contributor,
        body.fund,
        body.amount_cents,
        contributed_at,
    ) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.contributions.create(draft).await {
        Ok(contribution) => (StatusCode::CREATED, Json(contribution)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_contributions(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::ParishScopedQuery>,
) -> Response {
    let parish_id = match parse_optional_id(query.parish_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.contributions.list(parish_id).await {
        Ok(contributions) => {
            (StatusCode::OK, Json(json!({ "items": contributions }))).into_response()
        }
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_contribution(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: ContributionId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.contributions.get(id).await {
        Ok(contribution) => (StatusCode::OK, Json(contribution)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

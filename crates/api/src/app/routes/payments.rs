use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use vestry_core::{ParishId, PaymentId};
use vestry_finance::PaymentDraft;

use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_payment).get(list_payments))
        .route("/:id", get(get_payment))
        .route("/:id/complete", post(complete_payment))
        .route("/:id/void", post(void_payment))
}

pub async fn create_payment(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::CreatePaymentRequest>,
) -> Response {
    let parish_id: ParishId = match parse_id(&body.parish_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let draft = match PaymentDraft::new(parish_id, &body.payee, &body.purpose, body.amount_cents) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_response(e),
    };
    match services.payments.create(draft).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn list_payments(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::ParishScopedQuery>,
) -> Response {
    let parish_id = match parse_optional_id(query.parish_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.payments.list(parish_id).await {
        Ok(payments) => (StatusCode::OK, Json(json!({ "items": payments }))).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn get_payment(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    let id: PaymentId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.payments.get(id).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

pub async fn complete_payment(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    transition(services, id, |payment, now| payment.complete(now)).await
}

pub async fn void_payment(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> Response {
    transition(services, id, |payment, now| payment.void(now)).await
}

/// Fetch, apply the lifecycle transition, persist. The domain entity owns
/// the legality of the transition.
async fn transition<F>(services: AppServices, raw_id: String, apply: F) -> Response
where
    F: FnOnce(
        &mut vestry_finance::Payment,
        chrono::DateTime<Utc>,
    ) -> Result<(), vestry_core::DomainError>,
{
    let id: PaymentId = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut payment = match services.payments.get(id).await {
        Ok(payment) => payment,
        Err(e) => return errors::repository_error_response(e),
    };
    if let Err(e) = apply(&mut payment, Utc::now()) {
        return match e {
            vestry_core::DomainError::Validation(msg) => {
                errors::json_error(StatusCode::CONFLICT, "invalid_transition", msg)
            }
            other => errors::domain_error_response(other),
        };
    }
    match services.payments.update(payment).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use vestry_infra::ReportQuery;

use crate::app::routes::common::parse_optional_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/finance", get(finance_report))
}

pub async fn finance_report(
    Extension(services): Extension<AppServices>,
    Query(query): Query<dto::ReportQueryParams>,
) -> Response {
    let parish_id = match parse_optional_id(query.parish_id.as_deref()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let report_query = ReportQuery {
        parish_id,
        from: query.from,
        to: query.to,
    };
    match services.reports.finance_report(report_query).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::repository_error_response(e),
    }
}

//! HTTP application wiring (axum router + middleware stack).
//!
//! Layer order matters: requests pass through the timeout, then identity
//! extraction, then the authorization gate, and only then reach a handler.

use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{Extension, Router};
use tower::{BoxError, ServiceBuilder};

use vestry_auth::Hs256TokenVerifier;

use crate::config::ApiConfig;
use crate::{authz, identity, registry};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full application (services from config + router). Used by
/// `main.rs`.
pub async fn build_app(config: ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(&config).await?;
    Ok(build_router(services, &config))
}

/// Assemble the router around pre-built services. Tests construct services
/// directly (in-memory, pre-seeded) and call this.
pub fn build_router(services: AppServices, config: &ApiConfig) -> Router {
    let verifier = Arc::new(Hs256TokenVerifier::new(config.jwt_secret.as_bytes()));
    let auth_state = identity::AuthState { verifier };

    let registry = Arc::new(registry::operation_requirements());
    let gate_state = authz::GateState {
        registry: registry.clone(),
        resolver: services.resolver.clone(),
        identities: services.identities.clone(),
    };

    routes::router()
        .layer(Extension(services))
        .layer(Extension(registry))
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            authz::authorization_gate,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            identity::identity_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(tower::timeout::TimeoutLayer::new(config.request_timeout)),
        )
}

/// A request that hits its deadline is an infrastructure failure and must
/// never masquerade as a denial.
async fn handle_middleware_error(err: BoxError) -> axum::response::Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "request_timeout",
            "request exceeded its deadline",
        )
    } else {
        tracing::error!(error = %err, "middleware failure");
        errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal error",
        )
    }
}

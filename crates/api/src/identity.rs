//! Identity extraction middleware.
//!
//! Verifies a presented bearer credential and attaches the verified identity
//! to the request. A request without a credential passes through — whether
//! one is required is the gate's call. A *presented but invalid* credential
//! is rejected here, before the gate runs.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use vestry_auth::TokenVerifier;
use vestry_core::IdentityId;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// The verified identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIdentity {
    pub id: IdentityId,
    /// Diagnostic role hint from the token; never consulted for decisions.
    pub role_hint: Option<String>,
}

pub async fn identity_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return next.run(req).await;
    };

    match state.verifier.verify(token, Utc::now()) {
        Ok(claims) => {
            req.extensions_mut().insert(CurrentIdentity {
                id: claims.sub,
                role_hint: claims.role,
            });
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected presented bearer token");
            errors::json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string())
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

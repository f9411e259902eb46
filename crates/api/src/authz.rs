//! The authorization gate.
//!
//! Runs once per routed request, after identity extraction. Stateless per
//! call: the only inputs are the attached identity (or its absence), the
//! registry entry for the matched operation, and one ledger read. Every
//! failure path rejects — there is no error that recovers into an allow.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::json;

use vestry_auth::{EffectivePermissions, PermissionDenial};
use vestry_infra::{IdentityStore, PermissionResolver, RepositoryError};

use crate::app::errors;
use crate::identity::CurrentIdentity;
use crate::registry::RequirementRegistry;

#[derive(Clone)]
pub struct GateState {
    pub registry: Arc<RequirementRegistry>,
    pub resolver: PermissionResolver,
    pub identities: Arc<dyn IdentityStore>,
}

pub async fn authorization_gate(
    State(state): State<GateState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Routing inserts MatchedPath before router-level middleware runs.
    let Some(path) = req.extensions().get::<MatchedPath>().map(|p| p.as_str().to_owned())
    else {
        return next.run(req).await;
    };
    let method = req.method().clone();

    let Some(entry) = state.registry.lookup(&method, &path) else {
        // Public operation.
        return next.run(req).await;
    };

    let Some(current) = req.extensions().get::<CurrentIdentity>().cloned() else {
        tracing::warn!(%method, %path, "rejected unauthenticated request");
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        );
    };

    // Liveness: a deactivated identity keeps its assignments but is not
    // admitted. An unknown subject falls through — it holds zero roles and
    // fails any requirement below.
    match state.identities.get(current.id).await {
        Ok(identity) if !identity.is_active() => {
            tracing::warn!(identity = %current.id, %method, %path, "rejected deactivated identity");
            return errors::json_error(
                StatusCode::FORBIDDEN,
                "identity_inactive",
                "identity is deactivated",
            );
        }
        Ok(_) | Err(RepositoryError::NotFound(_)) => {}
        Err(e) => return unavailable(e),
    }

    // One ledger read per decision; both requirement kinds evaluate against
    // this same snapshot.
    let held = match state.resolver.assigned_roles(current.id).await {
        Ok(roles) => roles,
        Err(e) => return unavailable(e),
    };
    let held_names: Vec<&str> = held.iter().map(|r| r.name.as_str()).collect();

    if let Some(role_req) = &entry.roles {
        if !role_req.is_satisfied_by(held_names.iter().copied()) {
            tracing::warn!(
                identity = %current.id,
                %method,
                %path,
                required_roles = ?role_req.role_names,
                held_roles = ?held_names,
                "denied: role requirement not met"
            );
            return forbidden_roles(role_req.role_names.iter(), &held_names);
        }
    }

    if !entry.permissions.is_empty() {
        let effective = EffectivePermissions::resolve(held.iter().map(|r| &r.permissions));
        for requirement in &entry.permissions {
            if let Err(denial) = effective.check(requirement) {
                tracing::warn!(
                    identity = %current.id,
                    %method,
                    %path,
                    resource = %denial.resource,
                    missing = ?denial.missing_actions,
                    held_roles = ?held_names,
                    "denied: insufficient permissions"
                );
                return forbidden_permissions(&denial, &held_names);
            }
        }
    }

    tracing::debug!(identity = %current.id, %method, %path, "authorization granted");
    next.run(req).await
}

/// A failed resolution read is an infrastructure failure, never a deny.
fn unavailable(err: RepositoryError) -> Response {
    tracing::error!(error = %err, "authorization check unavailable");
    errors::json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "authorization_unavailable",
        "could not check permissions; retry later",
    )
}

fn forbidden_permissions(denial: &PermissionDenial, held_roles: &[&str]) -> Response {
    errors::json_body(
        StatusCode::FORBIDDEN,
        json!({
            "error": "forbidden",
            "message": format!(
                "missing actions on '{}': {:?}",
                denial.resource, denial.missing_actions
            ),
            "resource": denial.resource,
            "missing_actions": denial.missing_actions,
            "held_roles": held_roles,
        }),
    )
}

fn forbidden_roles<'a>(required: impl Iterator<Item = &'a String>, held_roles: &[&str]) -> Response {
    let required: Vec<&String> = required.collect();
    errors::json_body(
        StatusCode::FORBIDDEN,
        json!({
            "error": "forbidden",
            "message": format!("requires one of the roles {required:?}"),
            "required_roles": required,
            "held_roles": held_roles,
        }),
    )
}

use axum::{Router, routing::get};

pub mod common;
pub mod contributions;
pub mod identities;
pub mod masses;
pub mod offerings;
pub mod parishes;
pub mod payments;
pub mod reports;
pub mod roles;
pub mod system;

/// Every route, public and protected alike. Protection is the gate's job;
/// paths here must match the registry's templates exactly.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/system/operations", get(system::operations))
        .nest("/roles", roles::router())
        .nest("/identities", identities::router())
        .nest("/parishes", parishes::router())
        .nest("/masses", masses::router())
        .nest("/offerings", offerings::router())
        .nest("/contributions", contributions::router())
        .nest("/payments", payments::router())
        .nest("/reports", reports::router())
}

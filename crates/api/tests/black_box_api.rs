//! End-to-end tests over a real HTTP server on an ephemeral port, using the
//! in-memory backend pre-seeded with the stock role catalog.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use vestry_api::app::AppServices;
use vestry_api::config::ApiConfig;
use vestry_auth::{AccessClaims, IdentityDraft, PermissionMap, RoleDraft};
use vestry_core::IdentityId;
use vestry_infra::seed;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: AppServices,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let services = AppServices::in_memory();
        seed::seed_catalog(services.roles.as_ref())
            .await
            .expect("seeding an empty in-memory catalog cannot fail");

        let config = ApiConfig::for_tests(JWT_SECRET);
        let app = vestry_api::app::build_router(services.clone(), &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    /// Register an identity, assign it the named stock roles, and mint a
    /// token for it.
    async fn identity_with_roles(&self, email: &str, roles: &[&str]) -> (IdentityId, String) {
        let identity = self
            .services
            .identities
            .create(IdentityDraft::new(email, "Test User").unwrap())
            .await
            .unwrap();
        for name in roles {
            let role = self
                .services
                .roles
                .find_by_name(name)
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("stock role '{name}' missing"));
            self.services
                .assignments
                .assign(identity.id, role.id)
                .await
                .unwrap();
        }
        let token = mint_jwt(identity.id);
        (identity.id, token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(identity_id: IdentityId) -> String {
    let now = Utc::now();
    let claims = AccessClaims::new(identity_id, now, now + ChronoDuration::minutes(10));
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_reject_missing_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/roles", "/parishes", "/reports/finance"] {
        let res = client
            .get(format!("{}{path}", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated", "{path}");
    }
}

#[tokio::test]
async fn presented_but_invalid_token_is_rejected_outright() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Tampered signature.
    let mut token = mint_jwt(IdentityId::new());
    token.push('x');

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");

    // Even on a public route the bad credential is rejected.
    let res = client
        .get(format!("{}/health", srv.base_url))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_for_unknown_subject_holds_no_permissions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(IdentityId::new());

    let res = client
        .get(format!("{}/roles", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["resource"], "roles");
}

#[tokio::test]
async fn whoami_reports_roles_and_effective_permissions() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.identity_with_roles("pastor@stm.example", &["pastor"]).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["roles"], json!(["pastor"]));
    assert_eq!(body["effective"]["unrestricted"], false);
    assert!(body["effective"]["permissions"]["masses"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a == "delete"));
}

#[tokio::test]
async fn administrator_wildcard_passes_every_check() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/parishes", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "St. Monica", "address": "4 Vine St" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/system/operations", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["operations"].as_array().unwrap().len() > 20);
}

#[tokio::test]
async fn viewer_reads_but_cannot_write() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.identity_with_roles("viewer@stm.example", &["viewer"]).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/parishes", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/parishes", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "St. Monica" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["resource"], "parishes");
    assert_eq!(body["missing_actions"], json!(["write"]));
    assert_eq!(body["held_roles"], json!(["viewer"]));
}

#[tokio::test]
async fn treasurer_manages_finances_but_not_the_catalog() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let (_, treasurer) = srv
        .identity_with_roles("treasurer@stm.example", &["treasurer"])
        .await;
    let client = reqwest::Client::new();

    let parish: serde_json::Value = client
        .post(format!("{}/parishes", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "St. Monica" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/offerings", srv.base_url))
        .bearer_auth(&treasurer)
        .json(&json!({
            "parish_id": parish["id"],
            "amount_cents": 12_500,
            "method": "cash",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/reports/finance", srv.base_url))
        .bearer_auth(&treasurer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/roles", srv.base_url))
        .bearer_auth(&treasurer)
        .json(&json!({ "name": "usher" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/roles", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "treasurer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_name");
}

#[tokio::test]
async fn assignment_ledger_round_trip_over_http() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let client = reqwest::Client::new();

    let identity: serde_json::Value = client
        .post(format!("{}/identities", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "email": "clerk@stm.example", "display_name": "Parish Clerk" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let identity_id = identity["id"].as_str().unwrap();

    let secretary = srv
        .services
        .roles
        .find_by_name("secretary")
        .await
        .unwrap()
        .unwrap();

    let assign_url = format!("{}/identities/{identity_id}/roles", srv.base_url);
    let res = client
        .post(&assign_url)
        .bearer_auth(&admin)
        .json(&json!({ "role_id": secretary.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Assigning the same pair again conflicts.
    let res = client
        .post(&assign_url)
        .bearer_auth(&admin)
        .json(&json!({ "role_id": secretary.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_assigned");

    // The merged view reflects the assignment.
    let res = client
        .get(format!(
            "{}/identities/{identity_id}/permissions",
            srv.base_url
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["effective"]["permissions"]["masses"], json!(["read", "write"]));

    // Unassign, then the pair is gone.
    let unassign_url = format!(
        "{}/identities/{identity_id}/roles/{}",
        srv.base_url, secretary.id
    );
    let res = client.delete(&unassign_url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = client.delete(&unassign_url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revocation_is_visible_to_the_next_request() {
    let srv = TestServer::spawn().await;
    let (identity_id, token) = srv
        .identity_with_roles("sec@stm.example", &["secretary"])
        .await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/masses", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let secretary = srv
        .services
        .roles
        .find_by_name("secretary")
        .await
        .unwrap()
        .unwrap();
    srv.services
        .assignments
        .unassign(identity_id, secretary.id)
        .await
        .unwrap();

    // Same token, no grace period.
    let res = client
        .get(format!("{}/masses", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_role_revokes_it_from_every_holder() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let (_, viewer_token) = srv.identity_with_roles("v@stm.example", &["viewer"]).await;
    let client = reqwest::Client::new();

    let viewer = srv.services.roles.find_by_name("viewer").await.unwrap().unwrap();
    let res = client
        .delete(format!("{}/roles/{}", srv.base_url, viewer.id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/parishes", srv.base_url))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_deletion_demands_the_administrator_role_too() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // A custom role carrying the full manage triple on the catalog, but its
    // holder is not an administrator.
    let catalog_clerk = srv
        .services
        .roles
        .create(
            RoleDraft::new(
                "catalog-clerk",
                None,
                PermissionMap::new().grant("roles", ["read", "write", "delete"]),
            )
            .unwrap(),
        )
        .await
        .unwrap();
    let identity = srv
        .services
        .identities
        .create(IdentityDraft::new("clerk@stm.example", "Clerk").unwrap())
        .await
        .unwrap();
    srv.services
        .assignments
        .assign(identity.id, catalog_clerk.id)
        .await
        .unwrap();
    let token = mint_jwt(identity.id);

    // Can edit the catalog ...
    let res = client
        .post(format!("{}/roles", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "greeter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // ... but deletion also demands the administrator role.
    let viewer = srv.services.roles.find_by_name("viewer").await.unwrap().unwrap();
    let res = client
        .delete(format!("{}/roles/{}", srv.base_url, viewer.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["required_roles"], json!(["administrator"]));
}

#[tokio::test]
async fn operations_listing_is_role_gated() {
    let srv = TestServer::spawn().await;
    let (_, viewer) = srv.identity_with_roles("v@stm.example", &["viewer"]).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/system/operations", srv.base_url))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivated_identity_is_turned_away_with_roles_intact() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let (identity_id, token) = srv.identity_with_roles("p@stm.example", &["pastor"]).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/identities/{identity_id}/deactivate", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/masses", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "identity_inactive");

    // Reactivation restores the dormant assignments.
    client
        .post(format!("{}/identities/{identity_id}/activate", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let res = client
        .get(format!("{}/masses", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn voiding_a_payment_needs_write_and_delete_together() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let client = reqwest::Client::new();

    let parish: serde_json::Value = client
        .post(format!("{}/parishes", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "St. Monica" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let payment: serde_json::Value = client
        .post(format!("{}/payments", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "parish_id": parish["id"],
            "payee": "Roof & Sons",
            "purpose": "gutter repair",
            "amount_cents": 48_000,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let payment_id = payment["id"].as_str().unwrap();

    // A role with write but not delete on payments cannot void.
    let clerk_role = srv
        .services
        .roles
        .create(
            RoleDraft::new(
                "payments-clerk",
                None,
                PermissionMap::new().grant("payments", ["read", "write"]),
            )
            .unwrap(),
        )
        .await
        .unwrap();
    let clerk = srv
        .services
        .identities
        .create(IdentityDraft::new("pc@stm.example", "Payments Clerk").unwrap())
        .await
        .unwrap();
    srv.services
        .assignments
        .assign(clerk.id, clerk_role.id)
        .await
        .unwrap();
    let clerk_token = mint_jwt(clerk.id);

    let void_url = format!("{}/payments/{payment_id}/void", srv.base_url);
    let res = client.post(&void_url).bearer_auth(&clerk_token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["missing_actions"], json!(["delete"]));

    // The treasurer holds the full set and may void.
    let (_, treasurer) = srv
        .identity_with_roles("treasurer@stm.example", &["treasurer"])
        .await;
    let res = client.post(&void_url).bearer_auth(&treasurer).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "voided");

    // Voiding twice is an invalid transition.
    let res = client.post(&void_url).bearer_auth(&treasurer).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn payment_lifecycle_and_finance_report() {
    let srv = TestServer::spawn().await;
    let (_, admin) = srv
        .identity_with_roles("admin@stm.example", &["administrator"])
        .await;
    let client = reqwest::Client::new();

    let parish: serde_json::Value = client
        .post(format!("{}/parishes", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "St. Monica" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let parish_id = parish["id"].as_str().unwrap();

    client
        .post(format!("{}/offerings", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "parish_id": parish_id, "amount_cents": 5_000, "method": "cash" }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/contributions", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "parish_id": parish_id,
            "contributor": "A. Donor",
            "fund": "building",
            "amount_cents": 2_500,
        }))
        .send()
        .await
        .unwrap();

    let payment: serde_json::Value = client
        .post(format!("{}/payments", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "parish_id": parish_id,
            "payee": "Organ Tuner",
            "purpose": "annual tuning",
            "amount_cents": 1_000,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let payment_id = payment["id"].as_str().unwrap();
    assert_eq!(payment["status"], "pending");

    // Pending payments stay out of the report.
    let report: serde_json::Value = client
        .get(format!("{}/reports/finance?parish_id={parish_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["completed_payment_total_cents"], 0);
    assert_eq!(report["net_cents"], 7_500);

    let res = client
        .post(format!("{}/payments/{payment_id}/complete", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    assert!(!body["paid_at"].is_null());

    let report: serde_json::Value = client
        .get(format!("{}/reports/finance?parish_id={parish_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["offering_total_cents"], 5_000);
    assert_eq!(report["contribution_total_cents"], 2_500);
    assert_eq!(report["completed_payment_total_cents"], 1_000);
    assert_eq!(report["net_cents"], 6_500);
    assert_eq!(report["contributions_by_fund"][0]["fund"], "building");
}

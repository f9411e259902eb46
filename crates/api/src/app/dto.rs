//! Request DTOs and JSON mapping helpers.
//!
//! Domain entities serialize cleanly, so responses are the entities
//! themselves wrapped in small envelopes; only requests need shaping here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use vestry_auth::{EffectivePermissions, PermissionMap};
use vestry_finance::CollectionMethod;

/// Distinguishes an absent PATCH field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = "some")]`.
fn some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// -------------------------
// Roles & identities
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: PermissionMap,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "some")]
    pub description: Option<Option<String>>,
    pub permissions: Option<PermissionMap>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: String,
}

// -------------------------
// Parishes & masses
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateParishRequest {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParishRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "some")]
    pub address: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMassRequest {
    pub parish_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub celebrant: String,
    pub intention: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMassRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub celebrant: Option<String>,
    #[serde(default, deserialize_with = "some")]
    pub intention: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MassListQuery {
    pub parish_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// -------------------------
// Finance
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOfferingRequest {
    pub parish_id: String,
    pub mass_id: Option<String>,
    pub amount_cents: i64,
    pub method: CollectionMethod,
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContributionRequest {
    pub parish_id: String,
    pub contributor: String,
    pub fund: Option<String>,
    pub amount_cents: i64,
    pub contributed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub parish_id: String,
    pub payee: String,
    pub purpose: String,
    pub amount_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct ParishScopedQuery {
    pub parish_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQueryParams {
    pub parish_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// -------------------------
// Response helpers
// -------------------------

pub fn effective_to_json(effective: &EffectivePermissions) -> serde_json::Value {
    match effective {
        EffectivePermissions::Unrestricted => serde_json::json!({
            "unrestricted": true,
            "permissions": serde_json::Value::Null,
        }),
        EffectivePermissions::Scoped(map) => serde_json::json!({
            "unrestricted": false,
            "permissions": map,
        }),
    }
}

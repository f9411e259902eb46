//! `vestry-auth` — pure authorization & permission resolution boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it defines the
//! role/permission data model, the effective-permission merge, and the decision
//! rules. Fetching assignments and enforcing decisions live elsewhere.

pub mod claims;
pub mod identity;
pub mod permissions;
pub mod requirement;
pub mod resolve;
pub mod role;
pub mod token;

pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use identity::{Identity, IdentityDraft, IdentityStatus};
pub use permissions::{PermissionMap, WILDCARD};
pub use requirement::{AccessRequirement, ActionMatch, RoleRequirement};
pub use resolve::{EffectivePermissions, PermissionDenial};
pub use role::{Role, RoleChanges, RoleDraft, RoleName};
pub use token::{Hs256TokenVerifier, TokenError, TokenVerifier};

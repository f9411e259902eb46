//! Bearer-token claims (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vestry_core::IdentityId;

/// The minimal claim set expected once a token has been decoded and its
/// signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the identity this token was issued to.
    pub sub: IdentityId,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,

    /// Optional role-name hint carried for diagnostics only. Authorization
    /// always consults the ledger, never this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AccessClaims {
    pub fn new(sub: IdentityId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            role: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claim time window.
///
/// Signature verification is the verifier's job; this checks the *claims*
/// only, so it can be tested without key material.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims_at(now: DateTime<Utc>, iat: DateTime<Utc>, exp: DateTime<Utc>) -> Result<(), TokenValidationError> {
        validate_claims(&AccessClaims::new(IdentityId::new(), iat, exp), now)
    }

    #[test]
    fn accepts_a_token_inside_its_window() {
        let now = Utc::now();
        assert!(claims_at(now, now - Duration::minutes(1), now + Duration::minutes(10)).is_ok());
    }

    #[test]
    fn rejects_expired_tokens() {
        let now = Utc::now();
        let err = claims_at(now, now - Duration::minutes(20), now - Duration::minutes(10)).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn rejects_tokens_issued_in_the_future() {
        let now = Utc::now();
        let err = claims_at(now, now + Duration::minutes(5), now + Duration::minutes(15)).unwrap_err();
        assert_eq!(err, TokenValidationError::NotYetValid);
    }

    #[test]
    fn rejects_inverted_time_windows() {
        let now = Utc::now();
        let err = claims_at(now, now, now - Duration::minutes(1)).unwrap_err();
        assert_eq!(err, TokenValidationError::InvalidTimeWindow);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Identity, Role};

/// JWT claims Warden expects from its issuer.
///
/// Timestamps are seconds since the Unix epoch, as in RFC 7519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / caller identifier.
    pub sub: String,

    pub username: String,

    /// The single role granted to the caller.
    pub role: Role,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token has no subject")]
    MissingSubject,

    #[error("token has no role")]
    MissingRole,
}

/// Deterministically validate the time window of a token.
///
/// Signature checking happens before this, in the verifier; this only looks
/// at `iat`/`exp` against `now`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

impl TokenClaims {
    /// Build the request identity from already-verified claims.
    pub fn into_identity(self) -> Result<Identity, TokenValidationError> {
        if self.sub.trim().is_empty() {
            return Err(TokenValidationError::MissingSubject);
        }
        if self.role.as_str().trim().is_empty() {
            return Err(TokenValidationError::MissingRole);
        }
        Ok(Identity::new(self.sub, self.username, self.role))
    }
}

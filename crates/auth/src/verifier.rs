//! Token verification contract and the HS256 adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};
use crate::{BearerToken, Identity};

/// Why a token was not accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token time window is inverted")]
    InvalidTimeWindow,

    #[error("token issuer is not trusted")]
    UntrustedIssuer,

    #[error("malformed claims: {0}")]
    MalformedClaims(String),
}

impl From<TokenValidationError> for RejectionReason {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => Self::Expired,
            TokenValidationError::NotYetValid => Self::NotYetValid,
            TokenValidationError::InvalidTimeWindow => Self::InvalidTimeWindow,
            other @ (TokenValidationError::MissingSubject | TokenValidationError::MissingRole) => {
                Self::MalformedClaims(other.to_string())
            }
        }
    }
}

/// The verifier could not do its job (key material, remote JWKS, ...).
///
/// Distinct from a rejection: the caller's credentials may be fine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token verifier unavailable: {detail}")]
pub struct VerificationInfrastructureError {
    pub detail: String,
}

impl VerificationInfrastructureError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("token rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error(transparent)]
    Unavailable(#[from] VerificationInfrastructureError),
}

/// Verifies a bearer token and yields the identity it carries.
///
/// Implementations must not return `Ok` for a token whose signature or
/// validity window they have not checked.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, VerificationFailure>;
}

/// HMAC-SHA256 JWT verifier backed by `jsonwebtoken`.
///
/// `jsonwebtoken` checks the signature and decodes the claims; the time
/// window is checked by [`validate_claims`] against an injectable clock.
pub struct Hs256TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    clock: fn() -> DateTime<Utc>,
}

impl Hs256TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            clock: Utc::now,
        }
    }

    /// Require the `iss` claim to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer: String = issuer.into();
        self.validation.set_issuer(&[issuer]);
        self.validation.required_spec_claims.insert("iss".to_string());
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn decode(&self, token: &BearerToken) -> Result<TokenClaims, VerificationFailure> {
        let data = jsonwebtoken::decode::<TokenClaims>(token.as_str(), &self.key, &self.validation)
            .map_err(|e| classify(e.kind()))?;
        Ok(data.claims)
    }
}

#[async_trait]
impl TokenVerifier for Hs256TokenVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, VerificationFailure> {
        let claims = self.decode(token)?;
        validate_claims(&claims, (self.clock)()).map_err(RejectionReason::from)?;
        let identity = claims.into_identity().map_err(RejectionReason::from)?;
        Ok(identity)
    }
}

fn classify(kind: &ErrorKind) -> VerificationFailure {
    match kind {
        ErrorKind::InvalidSignature => RejectionReason::BadSignature.into(),
        ErrorKind::ExpiredSignature => RejectionReason::Expired.into(),
        ErrorKind::ImmatureSignature => RejectionReason::NotYetValid.into(),
        ErrorKind::InvalidIssuer => RejectionReason::UntrustedIssuer.into(),
        ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::Crypto(_) => VerificationInfrastructureError::new(format!("{kind:?}")).into(),
        other => RejectionReason::MalformedClaims(format!("{other:?}")).into(),
    }
}

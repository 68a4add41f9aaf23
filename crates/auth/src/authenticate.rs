//! Bearer credential extraction and verification, independent of transport.

use thiserror::Error;

use warden_core::DomainError;

use crate::{
    BearerToken, Identity, RejectionReason, TokenVerifier, VerificationFailure,
    VerificationInfrastructureError,
};

/// The caller did not prove who they are.
///
/// Every variant ends up as the same "unauthorized" response; the detail is
/// for logs only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("no credentials presented")]
    MissingCredentials,

    #[error("authorization scheme is not Bearer")]
    UnsupportedScheme,

    #[error("malformed token: {0}")]
    MalformedToken(DomainError),

    #[error("token rejected: {0}")]
    Rejected(RejectionReason),
}

/// Outcome of a failed authentication attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error(transparent)]
    Unauthenticated(#[from] AuthenticationError),

    #[error(transparent)]
    Infrastructure(#[from] VerificationInfrastructureError),
}

impl From<VerificationFailure> for AuthFailure {
    fn from(value: VerificationFailure) -> Self {
        match value {
            VerificationFailure::Rejected(reason) => {
                Self::Unauthenticated(AuthenticationError::Rejected(reason))
            }
            VerificationFailure::Unavailable(e) => Self::Infrastructure(e),
        }
    }
}

/// Extract a well-formed bearer token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; surrounding whitespace around the
/// token is ignored.
pub fn bearer_token(authorization: Option<&str>) -> Result<BearerToken, AuthenticationError> {
    let header = authorization
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthenticationError::MissingCredentials)?;

    let Some((scheme, rest)) = header.split_once(char::is_whitespace) else {
        return Err(if header.eq_ignore_ascii_case("bearer") {
            AuthenticationError::MissingCredentials
        } else {
            AuthenticationError::UnsupportedScheme
        });
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthenticationError::UnsupportedScheme);
    }

    let raw = rest.trim();
    if raw.is_empty() {
        return Err(AuthenticationError::MissingCredentials);
    }

    BearerToken::parse(raw).map_err(AuthenticationError::MalformedToken)
}

/// Authenticate a request from its `Authorization` header value.
///
/// The verifier is only consulted once a syntactically valid token has been
/// extracted.
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    authorization: Option<&str>,
) -> Result<Identity, AuthFailure> {
    let token = bearer_token(authorization)?;
    let identity = verifier.verify(&token).await?;
    Ok(identity)
}

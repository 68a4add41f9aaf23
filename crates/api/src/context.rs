use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::error;

use warden_auth::Identity;

use crate::app::errors::ApiError;

/// Authenticated identity for a request.
///
/// Inserted into the request's extensions by the authenticator and nothing
/// else; each request carries its own copy, so concurrent requests never see
/// each other's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity(Arc<Identity>);

impl RequestIdentity {
    pub fn new(identity: Identity) -> Self {
        Self(Arc::new(identity))
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl core::ops::Deref for RequestIdentity {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Handlers can take `RequestIdentity` directly.
///
/// A handler asking for one on a route without the authenticator is a wiring
/// defect, reported the same way the role check reports it.
#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestIdentity>().cloned().ok_or_else(|| {
            error!(
                path = parts.uri.path(),
                method = %parts.method,
                "handler requires an identity but none was attached"
            );
            ApiError::MiddlewareMisconfigured
        })
    }
}

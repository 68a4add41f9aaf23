//! Authenticator: bearer token in, `RequestIdentity` out.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use warden_auth::{AuthFailure, AuthenticationError, TokenVerifier};

use crate::app::errors::ApiError;
use crate::context::RequestIdentity;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

/// Verify the request's bearer token and attach the caller's identity.
///
/// Use with `axum::middleware::from_fn_with_state`. On any failure the
/// request goes no further; `next` runs exactly once on success.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| {
                    debug!(path = req.uri().path(), "authorization header is not valid UTF-8");
                    ApiError::Unauthenticated
                })?
                .to_owned(),
        ),
        None => None,
    };

    let identity = match warden_auth::authenticate(
        state.verifier.as_ref(),
        authorization.as_deref(),
    )
    .await
    {
        Ok(identity) => identity,
        Err(failure) => {
            log_failure(&req, &failure);
            return Err(failure.into());
        }
    };

    req.extensions_mut().insert(RequestIdentity::new(identity));
    Ok(next.run(req).await)
}

fn log_failure(req: &Request, failure: &AuthFailure) {
    let path = req.uri().path();
    let method = req.method();

    match failure {
        AuthFailure::Unauthenticated(AuthenticationError::Rejected(reason)) => {
            warn!(path, %method, %reason, "bearer token rejected");
        }
        AuthFailure::Unauthenticated(reason) => {
            debug!(path, %method, %reason, "request not authenticated");
        }
        AuthFailure::Infrastructure(e) => {
            error!(path, %method, error = %e, "token verifier failed");
        }
    }
}

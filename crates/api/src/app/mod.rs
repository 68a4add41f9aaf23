//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: event bus and audit trail owned by the process
//! - `routes/`: HTTP handlers, one file per area
//! - `errors.rs`: the error-to-response mapping used by middleware and routes

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use thiserror::Error;

use warden_auth::{ConfigurationError, Hs256TokenVerifier, TokenVerifier};
use warden_events::EventBusError;

use crate::config::ApiConfig;
use crate::middleware::{self, AuthState};

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Routes(#[from] ConfigurationError),

    #[error("failed to wire event handlers: {0}")]
    Events(#[from] EventBusError),
}

/// Build the full HTTP router with the HS256 verifier from `config`.
///
/// Also returns the services so the caller can shut the bus down.
pub fn build_app(config: &ApiConfig) -> Result<(Router, Arc<AppServices>), BuildError> {
    let mut verifier = Hs256TokenVerifier::new(config.jwt_secret.as_bytes());
    if let Some(issuer) = &config.jwt_issuer {
        verifier = verifier.with_issuer(issuer.clone());
    }

    let services = Arc::new(AppServices::build(config)?);
    let router = build_router(Arc::new(verifier), services.clone())?;
    Ok((router, services))
}

/// Assemble routes around an arbitrary verifier.
pub fn build_router(
    verifier: Arc<dyn TokenVerifier>,
    services: Arc<AppServices>,
) -> Result<Router, BuildError> {
    // Protected routes: authenticator outermost, role checks per route.
    let protected = routes::router()?
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            AuthState::new(verifier),
            middleware::authenticate,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected))
}

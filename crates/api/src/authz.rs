//! Authorizer: role check for routes behind the authenticator.
//!
//! `require_roles([...])` builds a tower layer; attach it with
//! `route_layer` so it runs after `middleware::authenticate`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{ConnectInfo, Request};
use axum::response::{IntoResponse, Response};
use futures::future::{Either, Ready, ready};
use tower::{Layer, Service};
use tracing::{debug, error, warn};

use warden_auth::{AccessError, AllowedRoles, ConfigurationError, Identity, Role, authorize};

use crate::app::errors::ApiError;
use crate::context::RequestIdentity;

/// Build the role check for a route.
///
/// Fails if `roles` is empty: a route nobody can reach is a wiring mistake.
pub fn require_roles<I, R>(roles: I) -> Result<RequireRolesLayer, ConfigurationError>
where
    I: IntoIterator<Item = R>,
    R: Into<Role>,
{
    Ok(RequireRolesLayer {
        allowed: Arc::new(AllowedRoles::new(roles)?),
    })
}

#[derive(Debug, Clone)]
pub struct RequireRolesLayer {
    allowed: Arc<AllowedRoles>,
}

impl RequireRolesLayer {
    pub fn allowed(&self) -> &AllowedRoles {
        &self.allowed
    }
}

impl<S> Layer<S> for RequireRolesLayer {
    type Service = RequireRoles<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRoles {
            inner,
            allowed: self.allowed.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireRoles<S> {
    inner: S,
    allowed: Arc<AllowedRoles>,
}

impl<S> Service<Request> for RequireRoles<S>
where
    S: Service<Request, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        match check(&req, &self.allowed) {
            Ok(()) => Either::Right(self.inner.call(req)),
            Err(e) => Either::Left(ready(Ok(e.into_response()))),
        }
    }
}

fn check(req: &Request, allowed: &AllowedRoles) -> Result<(), ApiError> {
    let identity: Option<&Identity> = req
        .extensions()
        .get::<RequestIdentity>()
        .map(RequestIdentity::identity);
    let path = req.uri().path();
    let method = req.method();

    match authorize(identity, allowed) {
        Ok(()) => {
            if let Some(who) = identity {
                debug!(
                    user_id = who.id(),
                    username = who.username(),
                    role = %who.role(),
                    path,
                    "access granted"
                );
            }
            Ok(())
        }
        Err(AccessError::Misconfigured(e)) => {
            error!(
                path,
                %method,
                required_roles = ?allowed.names(),
                error = %e,
                "role check reached without an authenticated identity"
            );
            Err(ApiError::MiddlewareMisconfigured)
        }
        Err(AccessError::Forbidden(denied)) => {
            warn!(
                user_id = identity.map(Identity::id),
                username = identity.map(Identity::username),
                role = %denied.user_role,
                required_roles = ?allowed.names(),
                path,
                %method,
                remote_addr = remote_addr(req).map(tracing::field::display),
                forwarded_for = forwarded_for(req),
                "access denied"
            );
            Err(ApiError::Forbidden(denied))
        }
    }
}

fn remote_addr(req: &Request) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn forwarded_for(req: &Request) -> Option<&str> {
    req.headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
}

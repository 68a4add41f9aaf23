use axum::{
    Router,
    routing::{delete, get, put},
};
use warden_auth::ConfigurationError;

use crate::authz::require_roles;

pub mod audit;
pub mod entities;
pub mod system;

/// Router for all authenticated endpoints.
///
/// Role checks are attached per method with `route_layer`; the caller wraps
/// the whole router in the authenticator.
pub fn router() -> Result<Router, ConfigurationError> {
    let managers = require_roles(["admin", "manager"])?;
    let admins = require_roles(["admin"])?;

    Ok(Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/entities/:entity/:id",
            put(entities::update)
                .route_layer(managers)
                .merge(delete(entities::delete).route_layer(admins.clone())),
        )
        .route("/audit", get(audit::list).route_layer(admins)))
}

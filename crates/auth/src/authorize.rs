use serde::Serialize;
use thiserror::Error;

use crate::{AllowedRoles, ConfigurationError, Identity, Role};

/// A verified caller whose role is not allowed on the route.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("role '{user_role}' is not permitted (requires one of {:?})", .required_roles.names())]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationError {
    pub required_roles: AllowedRoles,
    pub user_role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    /// The pipeline was wired wrong; this is never the caller's fault.
    #[error(transparent)]
    Misconfigured(#[from] ConfigurationError),
}

/// Decide whether `identity` may pass a route protected by `allowed`.
///
/// - No IO
/// - No panics
/// - A missing identity is a wiring defect, never a forbidden response
pub fn authorize(identity: Option<&Identity>, allowed: &AllowedRoles) -> Result<(), AccessError> {
    let identity = identity.ok_or(ConfigurationError::MissingAuthenticator)?;

    if allowed.contains(identity.role()) {
        Ok(())
    } else {
        Err(AuthorizationError {
            required_roles: allowed.clone(),
            user_role: identity.role().clone(),
        }
        .into())
    }
}

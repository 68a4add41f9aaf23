use serde::Serialize;

use crate::Role;

/// Verified identity of the caller for one request.
///
/// Only a [`TokenVerifier`](crate::TokenVerifier) produces these, from claims
/// it has checked. Fields are private so an identity cannot be edited after it
/// has been attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: String,
    username: String,
    role: Role,
}

impl Identity {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

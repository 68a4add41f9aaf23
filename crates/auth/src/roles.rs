use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; there is no hierarchy and no
/// implied permissions. `"admin"` grants nothing `"viewer"` does not unless a
/// route lists it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Misconfiguration of the authorization pipeline.
///
/// These are defects in how routes were wired, never caller errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("allowed role set must not be empty")]
    EmptyRoleSet,

    #[error("authorization ran without a preceding authentication step")]
    MissingAuthenticator,
}

/// Roles permitted on a protected route.
///
/// Non-empty and free of duplicates. Declaration order is kept so error
/// bodies list roles the way the route declared them; membership checks do
/// not depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowedRoles(Vec<Role>);

impl AllowedRoles {
    pub fn new<I, R>(roles: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        let mut unique: Vec<Role> = Vec::new();
        for role in roles.into_iter().map(Into::into) {
            if !unique.contains(&role) {
                unique.push(role);
            }
        }

        if unique.is_empty() {
            return Err(ConfigurationError::EmptyRoleSet);
        }
        Ok(Self(unique))
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.iter().any(|r| r == role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A constructed set is never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

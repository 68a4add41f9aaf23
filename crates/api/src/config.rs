//! Runtime configuration, read from environment variables.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

use warden_events::FailurePolicy;

const DEV_SECRET: &str = "dev-secret";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// How a route hands events to the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// The response waits until every subscriber has run.
    #[default]
    Awaited,
    /// Delivery happens on a spawned task; the response does not wait.
    Detached,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}' (expected {expected})")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub bind_addr: SocketAddr,
    pub delivery: DeliveryMode,
    pub failure_policy: FailurePolicy,
}

impl ApiConfig {
    /// Config suitable for tests: given secret, ephemeral port, defaults elsewhere.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_issuer: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            delivery: DeliveryMode::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = match lookup("JWT_SECRET") {
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
            Some(secret) if secret.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    var: "JWT_SECRET",
                    value: secret,
                    expected: "a non-empty secret",
                });
            }
            Some(secret) => secret,
        };

        let jwt_issuer = lookup("JWT_ISSUER").filter(|v| !v.trim().is_empty());

        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind.clone(),
            expected: "host:port",
        })?;

        let delivery = match lookup("EVENT_DELIVERY").as_deref().map(str::trim) {
            None | Some("") | Some("awaited") => DeliveryMode::Awaited,
            Some("detached") => DeliveryMode::Detached,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "EVENT_DELIVERY",
                    value: other.to_string(),
                    expected: "awaited | detached",
                });
            }
        };

        let failure_policy = match lookup("HANDLER_FAILURES").as_deref().map(str::trim) {
            None | Some("") | Some("isolate") => FailurePolicy::Isolate,
            Some("fail-fast") => FailurePolicy::FailFast,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "HANDLER_FAILURES",
                    value: other.to_string(),
                    expected: "isolate | fail-fast",
                });
            }
        };

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            bind_addr,
            delivery,
            failure_policy,
        })
    }
}

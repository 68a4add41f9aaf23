use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use warden_auth::{AccessError, AuthFailure, AuthorizationError};
use warden_events::EventBusError;

/// Every error the HTTP layer can answer with.
///
/// Bodies are `{ "error": <message>, "code": <stable code> }`; forbidden
/// responses add `requiredRoles` and `userRole`. Internal detail stays in the
/// logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("insufficient role")]
    Forbidden(AuthorizationError),

    #[error("authorization middleware is misconfigured")]
    MiddlewareMisconfigured,

    #[error("authentication is temporarily unavailable")]
    AuthenticationUnavailable,

    #[error("{0}")]
    BadRequest(String),

    #[error("event delivery failed")]
    EventDelivery(#[source] EventBusError),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MiddlewareMisconfigured
            | Self::AuthenticationUnavailable
            | Self::EventDelivery(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::MiddlewareMisconfigured => "MIDDLEWARE_CONFIG_ERROR",
            Self::AuthenticationUnavailable => "AUTHENTICATION_UNAVAILABLE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::EventDelivery(_) => "EVENT_DELIVERY_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(value: AuthFailure) -> Self {
        match value {
            AuthFailure::Unauthenticated(_) => Self::Unauthenticated,
            AuthFailure::Infrastructure(_) => Self::AuthenticationUnavailable,
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Forbidden(denied) => Self::Forbidden(denied),
            AccessError::Misconfigured(_) => Self::MiddlewareMisconfigured,
        }
    }
}

impl From<EventBusError> for ApiError {
    fn from(value: EventBusError) -> Self {
        Self::EventDelivery(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        if let Self::Forbidden(denied) = &self {
            body["requiredRoles"] = json!(denied.required_roles);
            body["userRole"] = json!(denied.user_role);
        }

        (self.status(), axum::Json(body)).into_response()
    }
}

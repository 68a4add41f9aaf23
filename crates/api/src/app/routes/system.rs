use axum::{Json, http::StatusCode};

use warden_auth::Identity;

use crate::context::RequestIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(identity: RequestIdentity) -> Json<Identity> {
    Json(identity.identity().clone())
}

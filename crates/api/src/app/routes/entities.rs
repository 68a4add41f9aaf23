//! Entity mutation endpoints.
//!
//! Storage of the entities themselves is out of scope here; these routes
//! record the change as a domain event so subscribers (the audit trail) can
//! react.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
};
use serde_json::json;

use warden_audit::{ChangeAction, EntityChanged};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestIdentity;

pub async fn update(
    identity: RequestIdentity,
    Extension(services): Extension<Arc<AppServices>>,
    Path((entity, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let metadata = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("body must be JSON: {e}")))?
    };

    record_change(&services, &identity, ChangeAction::Updated, entity, id, metadata).await
}

pub async fn delete(
    identity: RequestIdentity,
    Extension(services): Extension<Arc<AppServices>>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    record_change(
        &services,
        &identity,
        ChangeAction::Deleted,
        entity,
        id,
        serde_json::Value::Null,
    )
    .await
}

async fn record_change(
    services: &AppServices,
    identity: &RequestIdentity,
    action: ChangeAction,
    entity: String,
    id: String,
    metadata: serde_json::Value,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let event = EntityChanged::new(identity.id(), action, entity, id)
        .with_metadata(metadata)
        .into_event()
        .map_err(|e| ApiError::Internal(e.into()))?;
    let event_id = event.event_id();

    services.publish(event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "eventId": event_id, "action": action })),
    ))
}

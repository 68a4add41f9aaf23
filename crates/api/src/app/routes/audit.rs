use std::sync::Arc;

use axum::{Json, extract::Extension};

use warden_audit::AuditRecord;

use crate::app::services::AppServices;

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> Json<Vec<AuditRecord>> {
    Json(services.audit_records())
}

/// Journal handlers - the saga's HTTP surface
use actix_web::{web, HttpResponse};
use resilience::CancellationToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::AppSaga;
use crate::clients::CreateEntryPayload;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct CreateJournalRequest {
    pub entry: CreateEntryPayload,
    /// Duplicates are collapsed before the saga runs; the link service
    /// expects a set.
    #[serde(default)]
    pub linked_target_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Create a journal entry and atomically link it to targets
pub async fn create_journal(
    saga: web::Data<Arc<AppSaga>>,
    req: web::Json<CreateJournalRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let target_ids: BTreeSet<String> = req.linked_target_ids.into_iter().collect();

    let cancel = CancellationToken::new();
    let id = saga.execute(req.entry, target_ids, &cancel).await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// Read an entry composed with its linked target details
pub async fn get_journal(
    saga: web::Data<Arc<AppSaga>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let cancel = CancellationToken::new();
    let view = saga.composed_view(&path.into_inner(), &cancel).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "journal-gateway",
    }))
}

/// Entry handlers - HTTP endpoints for journal entry operations
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use subject_events::SubjectEventPublisher;
use tracing::warn;

use crate::error::Result;
use crate::models::CreateEntryRequest;
use crate::repo::{EntryRepo, PostCommitEffect};

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Shared handler state
pub struct EntryState {
    pub repo: EntryRepo,
    /// Absent in environments without a bus (tests, local smoke runs)
    pub publisher: Option<SubjectEventPublisher>,
}

/// Run post-commit effects; failures degrade freshness, never the write.
async fn run_effects(state: &EntryState, effects: Vec<PostCommitEffect>) {
    for effect in effects {
        match effect {
            PostCommitEffect::PublishSubjectChanged { subject_id, kind } => {
                let Some(publisher) = &state.publisher else {
                    continue;
                };
                if let Err(e) = publisher.publish_change(&subject_id, kind).await {
                    warn!(
                        error = %e,
                        subject_id = %subject_id,
                        "failed to publish subject change; caches converge on TTL"
                    );
                }
            }
        }
    }
}

/// Create a journal entry, then publish the change event
pub async fn create_entry(
    state: web::Data<Arc<EntryState>>,
    req: web::Json<CreateEntryRequest>,
) -> Result<HttpResponse> {
    let (entry, effects) = state.repo.create(&req)?;
    run_effects(&state, effects).await;

    Ok(HttpResponse::Created().json(CreatedResponse { id: entry.id }))
}

/// Get an entry by id
pub async fn get_entry(
    state: web::Data<Arc<EntryState>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let entry = state.repo.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(entry))
}

/// List entries for an owner, newest first
pub async fn list_entries_by_owner(
    state: web::Data<Arc<EntryState>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let entries = state.repo.list_by_owner(&path.into_inner());
    Ok(HttpResponse::Ok().json(entries))
}

/// Delete an entry (idempotent), then publish the change event
pub async fn delete_entry(
    state: web::Data<Arc<EntryState>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let effects = state.repo.delete(&path.into_inner());
    run_effects(&state, effects).await;

    Ok(HttpResponse::NoContent().finish())
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "journal-service",
    }))
}

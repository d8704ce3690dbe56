/// Link handlers - HTTP endpoints for link set operations
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::store::{LinkStore, MemoryPartitionWriter};

/// Store type the HTTP layer is wired against
pub type SharedLinkStore = LinkStore<MemoryPartitionWriter>;

#[derive(Debug, Deserialize)]
pub struct CreateLinksRequest {
    pub owner_id: String,
    pub target_ids: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
pub struct RearrangeRequest {
    #[serde(default)]
    pub remove: BTreeSet<String>,
    #[serde(default)]
    pub add: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
pub struct RearrangeResponse {
    pub rearranged: bool,
}

/// Create the requested links as one atomic batch
pub async fn create_links(
    store: web::Data<Arc<SharedLinkStore>>,
    req: web::Json<CreateLinksRequest>,
) -> Result<HttpResponse> {
    let docs = store.create_links(&req.owner_id, &req.target_ids).await?;
    Ok(HttpResponse::Created().json(docs))
}

/// Read the full link set for an owner (empty array when none)
pub async fn get_links(
    store: web::Data<Arc<SharedLinkStore>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let owner_id = path.into_inner();
    let docs = store.get_links(&owner_id).await?;
    Ok(HttpResponse::Ok().json(docs))
}

/// Atomically remove and add links for an owner
pub async fn rearrange_links(
    store: web::Data<Arc<SharedLinkStore>>,
    path: web::Path<String>,
    req: web::Json<RearrangeRequest>,
) -> Result<HttpResponse> {
    let owner_id = path.into_inner();
    let rearranged = store
        .rearrange_links(&owner_id, &req.remove, &req.add)
        .await?;

    let body = RearrangeResponse { rearranged };
    if rearranged {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::Conflict().json(body))
    }
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "link-service",
    }))
}

/// Dashboard handlers - cached composed reads plus internal invalidation
use actix_web::{web, HttpResponse};
use resilience::CancellationToken;
use std::sync::Arc;
use tracing::warn;

use super::AppDashboard;
use crate::dashboard::TaggedResponseCache;
use crate::error::{GatewayError, Result};

fn response_key(subject_id: &str) -> String {
    format!("dashboard:{subject_id}")
}

/// Serve the composed dashboard for a subject.
///
/// Layered: the tagged response cache first, then the aggregate cache
/// inside the dashboard service, then a fresh fan-out.
pub async fn get_dashboard(
    service: web::Data<Arc<AppDashboard>>,
    responses: web::Data<Arc<TaggedResponseCache>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let subject_id = path.into_inner();
    let key = response_key(&subject_id);

    if let Some(body) = responses.get(&key) {
        return Ok(HttpResponse::Ok()
            .content_type("application/json")
            .body(body));
    }

    let cancel = CancellationToken::new();
    let aggregate = match service.get(&subject_id, &cancel).await {
        Ok(aggregate) => aggregate,
        Err(e @ GatewayError::RemoteInvocation(_)) => return Err(e),
        Err(e) => {
            // A cache-layer fault must never fail the read; fall back to a
            // fresh composed fetch.
            warn!(error = %e, subject_id, "cached read failed, composing fresh");
            service.compose(&subject_id, &cancel).await?
        }
    };

    let body = serde_json::to_string(&aggregate)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    responses.insert(key, subject_id, body.clone());

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

/// Internal-only: drop the subject's cached dashboard state
pub async fn invalidate_dashboard(
    service: web::Data<Arc<AppDashboard>>,
    responses: web::Data<Arc<TaggedResponseCache>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let subject_id = path.into_inner();

    service.cache().invalidate(&subject_id);
    responses.evict_tag(&subject_id);

    Ok(HttpResponse::NoContent().finish())
}

/// Cache hit/miss/invalidation counters
pub async fn cache_stats(service: web::Data<Arc<AppDashboard>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.cache().stats()))
}

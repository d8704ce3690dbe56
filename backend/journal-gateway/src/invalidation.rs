//! Subject change event consumer.
//!
//! Subscribes to the `subject-updates` channel and evicts both the
//! dashboard aggregate cache and the tagged response cache for the changed
//! subject. Delivery is at-least-once; eviction of an absent key is a
//! no-op, so the handler is idempotent by construction. Failures here
//! degrade freshness only — they never propagate to the write path that
//! produced the event.

use std::sync::Arc;
use subject_events::{ChangeEvent, SubjectEventSubscriber};
use tokio::task::JoinHandle;
use tracing::info;

use crate::dashboard::{DashboardCache, TaggedResponseCache};

/// Evicts gateway caches in response to subject change events
pub struct InvalidationConsumer {
    cache: Arc<DashboardCache>,
    responses: Arc<TaggedResponseCache>,
}

impl InvalidationConsumer {
    pub fn new(cache: Arc<DashboardCache>, responses: Arc<TaggedResponseCache>) -> Self {
        Self { cache, responses }
    }

    /// Handle one event. Idempotent: replaying the same event is harmless.
    pub fn handle(&self, event: &ChangeEvent) {
        info!(
            subject_id = %event.subject_id,
            kind = %event.kind,
            source = %event.source_service,
            "invalidating caches for changed subject"
        );
        self.cache.invalidate(&event.subject_id);
        self.responses.evict_tag(&event.subject_id);
    }

    /// Wire the consumer to a bus subscription and return the task handle
    pub async fn run(
        self: Arc<Self>,
        subscriber: SubjectEventSubscriber,
    ) -> Result<JoinHandle<()>, subject_events::SubjectEventError> {
        subscriber
            .subscribe(move |event| {
                let consumer = Arc::clone(&self);
                async move {
                    consumer.handle(&event);
                    Ok(())
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardAggregate;
    use chrono::Utc;
    use std::time::Duration;

    fn consumer() -> InvalidationConsumer {
        InvalidationConsumer::new(
            Arc::new(DashboardCache::new(Duration::from_secs(60))),
            Arc::new(TaggedResponseCache::new(Duration::from_secs(60))),
        )
    }

    fn aggregate(subject: &str) -> DashboardAggregate {
        DashboardAggregate {
            subject_id: subject.to_string(),
            user: None,
            entries: Vec::new(),
            tasks: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn evicts_both_caches() {
        let consumer = consumer();
        consumer.cache.insert(aggregate("user-1"));
        consumer
            .responses
            .insert("dashboard:user-1", "user-1", "{}".to_string());

        consumer.handle(&ChangeEvent::updated("user-1", "journal-service"));

        assert!(consumer.cache.get("user-1").is_none());
        assert!(consumer.responses.get("dashboard:user-1").is_none());
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let consumer = consumer();
        consumer.cache.insert(aggregate("user-1"));

        let event = ChangeEvent::updated("user-1", "journal-service");
        consumer.handle(&event);
        consumer.handle(&event);

        // A subject that was never cached is equally fine.
        consumer.handle(&ChangeEvent::updated("stranger", "journal-service"));
    }
}

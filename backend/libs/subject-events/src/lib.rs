//! Subject change events over Redis Pub/Sub
//!
//! Carries "subject changed" notifications between services so that
//! read-side caches can be invalidated asynchronously.
//!
//! # Architecture
//!
//! ```text
//! journal-service:
//!   1. Commit the entry mutation to its store
//!   2. Publish the change AFTER the commit:
//!      PUBLISH subject-updates {"subject_id": "user-123", "kind": "updated"}
//!      ↓
//! Redis Pub/Sub (broadcast to all subscribers)
//!      ↓
//! journal-gateway:
//!   3. Receive the event
//!   4. DashboardCache::invalidate("user-123")
//!   5. Evict tagged response-cache entries for "user-123"
//! ```
//!
//! Delivery is at-least-once: the bus may replay an event, so handlers must
//! be idempotent. Invalidating an already-absent key is a no-op, which
//! satisfies this.
//!
//! # Example: publisher
//!
//! ```no_run
//! use subject_events::{ChangeEvent, SubjectEventPublisher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher =
//!         SubjectEventPublisher::new("redis://localhost:6379", "journal-service".into()).await?;
//!     publisher
//!         .publish(&ChangeEvent::updated("user-123", "journal-service"))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: subscriber
//!
//! ```no_run
//! use subject_events::SubjectEventSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let subscriber = SubjectEventSubscriber::new("redis://localhost:6379").await?;
//!     let handle = subscriber
//!         .subscribe(|event| async move {
//!             println!("subject changed: {}", event.subject_id);
//!             Ok(())
//!         })
//!         .await?;
//!     handle.await?;
//!     Ok(())
//! }
//! ```

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

mod error;

pub use error::SubjectEventError;

type Result<T> = std::result::Result<T, SubjectEventError>;

/// Kind of change a subject underwent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Custom(String),
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ChangeKind {
    fn from(s: &str) -> Self {
        match s {
            "created" => ChangeKind::Created,
            "updated" => ChangeKind::Updated,
            "deleted" => ChangeKind::Deleted,
            custom => ChangeKind::Custom(custom.to_string()),
        }
    }
}

/// A "subject changed" notification.
///
/// Not persisted; consumers derive a cache key from `subject_id` and evict.
/// Publishers must emit this only after the underlying mutation is durably
/// committed, never before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_id: String,
    pub subject_id: String,
    pub kind: ChangeKind,
    pub source_service: String,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl ChangeEvent {
    pub fn new(subject_id: impl Into<String>, kind: ChangeKind, source: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            kind,
            source_service: source.into(),
            occurred_at: chrono::Utc::now(),
            metadata: None,
        }
    }

    pub fn created(subject_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(subject_id, ChangeKind::Created, source)
    }

    pub fn updated(subject_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(subject_id, ChangeKind::Updated, source)
    }

    pub fn deleted(subject_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(subject_id, ChangeKind::Deleted, source)
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Publisher for subject change events
#[derive(Clone)]
pub struct SubjectEventPublisher {
    connection: ConnectionManager,
    channel: String,
    service_name: String,
}

impl SubjectEventPublisher {
    /// Default Redis channel for subject change events
    pub const DEFAULT_CHANNEL: &'static str = "subject-updates";

    pub async fn new(redis_url: &str, service_name: String) -> Result<Self> {
        Self::with_channel(redis_url, service_name, Self::DEFAULT_CHANNEL.to_string()).await
    }

    /// Create a publisher bound to a custom channel
    pub async fn with_channel(
        redis_url: &str,
        service_name: String,
        channel: String,
    ) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection,
            channel,
            service_name,
        })
    }

    /// Publish a change event.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn publish(&self, event: &ChangeEvent) -> Result<usize> {
        let payload = serde_json::to_string(event)?;

        debug!(
            event_id = %event.event_id,
            subject_id = %event.subject_id,
            kind = %event.kind,
            channel = %self.channel,
            "publishing subject change event"
        );

        let mut conn = self.connection.clone();
        let subscriber_count: usize = conn.publish(&self.channel, payload).await?;

        info!(
            event_id = %event.event_id,
            subject_id = %event.subject_id,
            subscribers = subscriber_count,
            "subject change event published"
        );

        Ok(subscriber_count)
    }

    /// Publish a change for a subject, stamping this publisher's service name
    pub async fn publish_change(&self, subject_id: &str, kind: ChangeKind) -> Result<usize> {
        let event = ChangeEvent::new(subject_id, kind, self.service_name.clone());
        self.publish(&event).await
    }
}

/// Subscriber for subject change events
pub struct SubjectEventSubscriber {
    client: Client,
    channel: String,
}

impl SubjectEventSubscriber {
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_channel(redis_url, SubjectEventPublisher::DEFAULT_CHANNEL.to_string()).await
    }

    pub async fn with_channel(redis_url: &str, channel: String) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client, channel })
    }

    /// Subscribe with a callback, returning the background task handle.
    ///
    /// Undecodable payloads are logged and skipped; callback failures are
    /// logged and never abort the subscription.
    pub async fn subscribe<F, Fut>(&self, callback: F) -> Result<JoinHandle<()>>
    where
        F: Fn(ChangeEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        info!(channel = %self.channel, "subscribed to subject change events");

        let callback = Arc::new(callback);

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();

            while let Some(msg) = stream.next().await {
                let payload = match msg.get_payload::<String>() {
                    Ok(p) => p,
                    Err(e) => {
                        error!(error = ?e, "failed to read event payload");
                        continue;
                    }
                };

                let event: ChangeEvent = match serde_json::from_str(&payload) {
                    Ok(ev) => ev,
                    Err(e) => {
                        error!(error = ?e, payload = %payload, "failed to decode change event");
                        continue;
                    }
                };

                debug!(
                    event_id = %event.event_id,
                    subject_id = %event.subject_id,
                    kind = %event.kind,
                    "received subject change event"
                );

                let callback = Arc::clone(&callback);
                if let Err(e) = callback(event.clone()).await {
                    error!(
                        error = ?e,
                        event_id = %event.event_id,
                        "change event handler failed"
                    );
                }
            }

            warn!("subject event subscription ended");
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Created.to_string(), "created");
        assert_eq!(ChangeKind::Deleted.to_string(), "deleted");
        assert_eq!(ChangeKind::Custom("archived".into()).to_string(), "archived");
    }

    #[test]
    fn test_change_kind_from_str() {
        assert_eq!(ChangeKind::from("updated"), ChangeKind::Updated);
        assert_eq!(
            ChangeKind::from("archived"),
            ChangeKind::Custom("archived".into())
        );
    }

    #[test]
    fn test_change_event_constructors() {
        let event = ChangeEvent::updated("user-123", "journal-service");
        assert_eq!(event.subject_id, "user-123");
        assert_eq!(event.kind, ChangeKind::Updated);
        assert_eq!(event.source_service, "journal-service");
        assert!(event.metadata.is_none());
    }

    #[test]
    fn test_change_event_metadata() {
        let event = ChangeEvent::created("user-1", "journal-service")
            .with_metadata(serde_json::json!({"entry_id": "e-9"}));
        assert_eq!(event.metadata.unwrap()["entry_id"], "e-9");
    }

    #[test]
    fn test_change_event_serialization() {
        let event = ChangeEvent::deleted("user-7", "journal-service");
        let json = serde_json::to_string(&event).unwrap();
        let decoded: ChangeEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.event_id, decoded.event_id);
        assert_eq!(event.subject_id, decoded.subject_id);
        assert_eq!(event.kind, decoded.kind);
    }
}

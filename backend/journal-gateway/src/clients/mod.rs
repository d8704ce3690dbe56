//! Thin HTTP clients for the downstream services.
//!
//! Each client trait is the seam the saga and the dashboard composer are
//! written against; the reqwest implementations in [`http`] wrap every call
//! in the shared bounded-retry policy. Transient failures (5xx, timeout,
//! connection reset) are retried with a fixed delay; 4xx and decode
//! failures are surfaced immediately.

pub mod http;

pub use http::{HttpEntryOwnerClient, HttpLinkClient, HttpTaskClient, HttpUserClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resilience::{CancellationToken, Transient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[cfg(test)]
use mockall::automock;

/// Reference to an entry created in the journal service.
///
/// Opaque to the saga beyond `id`; `owner_user_id` rides along as the
/// dashboard subject the entry belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryRef {
    pub id: String,
    pub owner_user_id: String,
}

/// Full entry detail as served by the journal service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryDetail {
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Link document as served by the link service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkDocument {
    pub id: String,
    pub owner_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}

/// Task summary as served by the task service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub status: String,
}

/// User profile as served by the user service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
}

/// Payload for creating a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryPayload {
    pub owner_user_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Downstream invocation errors
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Network-level failure (timeout, connection reset); retried
    #[error("transport failure calling {service}: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// Non-success HTTP status; 5xx is retried, 4xx is not
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// Response body could not be decoded; never retried
    #[error("failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Link service returned a different number of links than requested
    #[error("{service} created {actual} links, expected {expected}")]
    LinkCountMismatch {
        service: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The caller cancelled the operation
    #[error("call to {service} cancelled")]
    Cancelled { service: &'static str },
}

impl Transient for RemoteError {
    fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport { .. } => true,
            RemoteError::Status { status, .. } => *status >= 500,
            RemoteError::Decode { .. }
            | RemoteError::LinkCountMismatch { .. }
            | RemoteError::Cancelled { .. } => false,
        }
    }
}

/// Entry-owner service (journal service) operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntryOwnerApi: Send + Sync {
    /// Create an entry; fails on non-success status or undecodable body
    async fn create_entry(
        &self,
        payload: &CreateEntryPayload,
        cancel: &CancellationToken,
    ) -> Result<EntryRef, RemoteError>;

    /// Best-effort compensating delete
    async fn delete_entry(&self, id: &str, cancel: &CancellationToken) -> Result<(), RemoteError>;

    async fn get_entry(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<EntryDetail, RemoteError>;

    async fn entries_by_owner(
        &self,
        owner_user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryDetail>, RemoteError>;
}

/// Link service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LinkApi: Send + Sync {
    /// Create one link per target; fails when the returned link count does
    /// not equal the requested count
    async fn link_entry_to_targets(
        &self,
        entry_id: &str,
        target_ids: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkDocument>, RemoteError>;

    async fn get_links(
        &self,
        owner_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkDocument>, RemoteError>;
}

/// Task service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Batch-fetch task details for the given ids
    async fn get_tasks(
        &self,
        ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskSummary>, RemoteError>;

    /// All tasks owned by a user
    async fn tasks_for_user(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskSummary>, RemoteError>;
}

/// User service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn get_user(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_5xx_are_transient() {
        assert!(RemoteError::Transport {
            service: "link-service",
            message: "connection reset".into(),
        }
        .is_transient());
        assert!(RemoteError::Status {
            service: "link-service",
            status: 503,
        }
        .is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!RemoteError::Status {
            service: "journal-service",
            status: 400,
        }
        .is_transient());
        assert!(!RemoteError::Decode {
            service: "journal-service",
            message: "missing id".into(),
        }
        .is_transient());
        assert!(!RemoteError::LinkCountMismatch {
            service: "link-service",
            expected: 3,
            actual: 2,
        }
        .is_transient());
    }
}

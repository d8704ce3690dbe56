//! reqwest implementations of the downstream client traits.
//!
//! Every call runs inside the shared retry decorator, parameterized by the
//! gateway's configured retry count and delay, and observes the caller's
//! cancellation token.

use async_trait::async_trait;
use resilience::{with_retry, CancellationToken, RetryConfig, RetryError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

use super::{
    CreateEntryPayload, EntryDetail, EntryOwnerApi, EntryRef, LinkApi, LinkDocument, RemoteError,
    TaskApi, TaskSummary, UserApi, UserProfile,
};

fn classify_send_error(service: &'static str, err: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        service,
        message: err.to_string(),
    }
}

fn unwrap_retry(service: &'static str, err: RetryError<RemoteError>) -> RemoteError {
    match err {
        RetryError::RetriesExhausted { last, .. } => last,
        RetryError::Permanent(e) => e,
        RetryError::Cancelled => RemoteError::Cancelled { service },
    }
}

/// Send a request and decode a JSON body, classifying failures
async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    builder: reqwest::RequestBuilder,
) -> Result<T, RemoteError> {
    let response = builder
        .send()
        .await
        .map_err(|e| classify_send_error(service, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            service,
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| RemoteError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Send a request and discard the body, classifying failures
async fn send_empty(
    service: &'static str,
    builder: reqwest::RequestBuilder,
) -> Result<(), RemoteError> {
    let response = builder
        .send()
        .await
        .map_err(|e| classify_send_error(service, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            service,
            status: status.as_u16(),
        });
    }

    Ok(())
}

/// Client for the journal (entry-owner) service
pub struct HttpEntryOwnerClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpEntryOwnerClient {
    const SERVICE: &'static str = "journal-service";

    pub fn new(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[async_trait]
impl EntryOwnerApi for HttpEntryOwnerClient {
    async fn create_entry(
        &self,
        payload: &CreateEntryPayload,
        cancel: &CancellationToken,
    ) -> Result<EntryRef, RemoteError> {
        let url = format!("{}/entries", self.base_url);
        debug!(url = %url, "creating entry");

        let created: CreatedResponse = with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.post(&url).json(payload))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))?;

        Ok(EntryRef {
            id: created.id,
            owner_user_id: payload.owner_user_id.clone(),
        })
    }

    async fn delete_entry(&self, id: &str, cancel: &CancellationToken) -> Result<(), RemoteError> {
        let url = format!("{}/entries/{}", self.base_url, id);
        debug!(url = %url, "deleting entry");

        with_retry(&self.retry, cancel, || {
            send_empty(Self::SERVICE, self.http.delete(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }

    async fn get_entry(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<EntryDetail, RemoteError> {
        let url = format!("{}/entries/{}", self.base_url, id);

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.get(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }

    async fn entries_by_owner(
        &self,
        owner_user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryDetail>, RemoteError> {
        let url = format!("{}/entries/by-owner/{}", self.base_url, owner_user_id);

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.get(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }
}

/// Client for the link service
pub struct HttpLinkClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpLinkClient {
    const SERVICE: &'static str = "link-service";

    pub fn new(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl LinkApi for HttpLinkClient {
    async fn link_entry_to_targets(
        &self,
        entry_id: &str,
        target_ids: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkDocument>, RemoteError> {
        let url = format!("{}/links", self.base_url);
        let body = serde_json::json!({
            "owner_id": entry_id,
            "target_ids": target_ids,
        });
        debug!(url = %url, entry_id, count = target_ids.len(), "creating links");

        let links: Vec<LinkDocument> = with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.post(&url).json(&body))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))?;

        if links.len() != target_ids.len() {
            return Err(RemoteError::LinkCountMismatch {
                service: Self::SERVICE,
                expected: target_ids.len(),
                actual: links.len(),
            });
        }

        Ok(links)
    }

    async fn get_links(
        &self,
        owner_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkDocument>, RemoteError> {
        let url = format!("{}/links/{}", self.base_url, owner_id);

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.get(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }
}

/// Client for the task service
pub struct HttpTaskClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpTaskClient {
    const SERVICE: &'static str = "task-service";

    pub fn new(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskClient {
    async fn get_tasks(
        &self,
        ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskSummary>, RemoteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/tasks/batch", self.base_url);
        let body = serde_json::json!({ "ids": ids });

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.post(&url).json(&body))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }

    async fn tasks_for_user(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskSummary>, RemoteError> {
        let url = format!("{}/tasks/by-user/{}", self.base_url, user_id);

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.get(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }
}

/// Client for the user service
pub struct HttpUserClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpUserClient {
    const SERVICE: &'static str = "user-service";

    pub fn new(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl UserApi for HttpUserClient {
    async fn get_user(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, RemoteError> {
        let url = format!("{}/users/{}", self.base_url, id);

        with_retry(&self.retry, cancel, || {
            send_json(Self::SERVICE, self.http.get(&url))
        })
        .await
        .map_err(|e| unwrap_retry(Self::SERVICE, e))
    }
}

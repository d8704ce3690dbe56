//! Journal creation saga.
//!
//! Creates an entry in the journal service, then links it to targets in the
//! link service. There is no distributed transaction: when the link step
//! fails, the already-committed entry is compensated with a best-effort
//! delete and the caller gets a single aborted-saga error naming the step
//! that failed.
//!
//! State machine per execution:
//!
//! ```text
//! Start -> EntryCreated -> LinksCreated                      (success)
//! Start -> EntryCreated -> RollingBack -> RolledBack         (link failure)
//! Start -> EntryCreated -> RollingBack -> CompensationFailed (orphaned entry)
//! ```
//!
//! Steps are strictly sequential; there is no parallelism within one
//! execution. The saga is not idempotent across whole-operation retries: if
//! compensation itself fails, the entry is orphaned with no links. A
//! production deployment needs an idempotency key or a periodic
//! reconciliation sweep for that case; neither exists here yet.

use std::collections::BTreeSet;
use std::sync::Arc;

use resilience::CancellationToken;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::clients::{
    CreateEntryPayload, EntryDetail, EntryOwnerApi, LinkApi, TaskApi, TaskSummary,
};
use crate::error::{GatewayError, Result};

/// Saga step identifiers, carried in the abort error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    CreateEntry,
    LinkTargets,
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaStep::CreateEntry => write!(f, "create_entry"),
            SagaStep::LinkTargets => write!(f, "link_targets"),
        }
    }
}

/// Execution states, logged as the saga advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SagaState {
    Start,
    EntryCreated,
    LinksCreated,
    RollingBack,
    RolledBack,
    CompensationFailed,
}

/// An entry together with the task details it links to
#[derive(Debug, Clone, Serialize)]
pub struct EntryWithTargets {
    pub entry: EntryDetail,
    pub targets: Vec<TaskSummary>,
}

pub struct JournalCreationSaga<E, L, T> {
    entries: Arc<E>,
    links: Arc<L>,
    tasks: Arc<T>,
}

impl<E, L, T> JournalCreationSaga<E, L, T>
where
    E: EntryOwnerApi,
    L: LinkApi,
    T: TaskApi,
{
    pub fn new(entries: Arc<E>, links: Arc<L>, tasks: Arc<T>) -> Self {
        Self {
            entries,
            links,
            tasks,
        }
    }

    /// Create an entry and link it to `target_ids`, compensating on failure.
    ///
    /// Returns the created entry id on success. An entry-creation failure
    /// propagates as-is (nothing was committed, nothing to undo). A link
    /// failure triggers the compensating delete, whose own failure is logged
    /// and swallowed so the original failure reason survives, and the caller
    /// sees [`GatewayError::SagaAborted`].
    pub async fn execute(
        &self,
        payload: CreateEntryPayload,
        target_ids: BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut state = SagaState::Start;
        info!(targets = target_ids.len(), state = ?state, "saga started");

        let entry = self.entries.create_entry(&payload, cancel).await?;
        state = SagaState::EntryCreated;
        info!(entry_id = %entry.id, state = ?state, "entry created");

        match self
            .links
            .link_entry_to_targets(&entry.id, &target_ids, cancel)
            .await
        {
            Ok(links) => {
                state = SagaState::LinksCreated;
                info!(
                    entry_id = %entry.id,
                    links = links.len(),
                    state = ?state,
                    "journal creation complete"
                );
                Ok(entry.id)
            }
            Err(link_err) => {
                state = SagaState::RollingBack;
                warn!(
                    entry_id = %entry.id,
                    error = %link_err,
                    state = ?state,
                    "link step failed, compensating"
                );

                state = self.compensate(&entry.id).await;
                match state {
                    SagaState::RolledBack => {
                        info!(entry_id = %entry.id, state = ?state, "saga rolled back")
                    }
                    _ => error!(
                        entry_id = %entry.id,
                        state = ?state,
                        "saga aborted without rollback, entry orphaned"
                    ),
                }

                Err(GatewayError::SagaAborted {
                    step: SagaStep::LinkTargets,
                    reason: link_err.to_string(),
                })
            }
        }
    }

    /// Best-effort compensating delete for a committed entry.
    ///
    /// Runs on a fresh token: a cancelled request must not leave the entry
    /// behind without even trying. The delete's own failure is absorbed so
    /// the original link failure stays the surfaced reason; the returned
    /// terminal state says whether the entry was actually removed or is now
    /// orphaned.
    async fn compensate(&self, entry_id: &str) -> SagaState {
        match self
            .entries
            .delete_entry(entry_id, &CancellationToken::new())
            .await
        {
            Ok(()) => SagaState::RolledBack,
            Err(comp_err) => {
                error!(
                    entry_id,
                    error = %comp_err,
                    "compensating delete failed"
                );
                SagaState::CompensationFailed
            }
        }
    }

    /// Read an entry together with the details of its linked targets.
    ///
    /// An entry with no links yields an empty target list, not an error.
    pub async fn composed_view(
        &self,
        entry_id: &str,
        cancel: &CancellationToken,
    ) -> Result<EntryWithTargets> {
        let entry = self.entries.get_entry(entry_id, cancel).await?;
        let links = self.links.get_links(entry_id, cancel).await?;

        if links.is_empty() {
            return Ok(EntryWithTargets {
                entry,
                targets: Vec::new(),
            });
        }

        let ids: Vec<String> = links.into_iter().map(|l| l.target_id).collect();
        let targets = self.tasks.get_tasks(&ids, cancel).await?;

        Ok(EntryWithTargets { entry, targets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{
        EntryRef, LinkDocument, MockEntryOwnerApi, MockLinkApi, MockTaskApi, RemoteError,
    };
    use chrono::Utc;

    fn payload() -> CreateEntryPayload {
        CreateEntryPayload {
            owner_user_id: "user-1".to_string(),
            title: "trip notes".to_string(),
            body: String::new(),
        }
    }

    fn targets(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn entry_ref(id: &str) -> EntryRef {
        EntryRef {
            id: id.to_string(),
            owner_user_id: "user-1".to_string(),
        }
    }

    fn link_doc(owner: &str, target: &str) -> LinkDocument {
        LinkDocument {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            target_id: target.to_string(),
            created_at: Utc::now(),
        }
    }

    fn remote_5xx(service: &'static str) -> RemoteError {
        RemoteError::Status {
            service,
            status: 503,
        }
    }

    #[tokio::test]
    async fn happy_path_returns_entry_id() {
        let mut entries = MockEntryOwnerApi::new();
        entries
            .expect_create_entry()
            .times(1)
            .returning(|_, _| Ok(entry_ref("E1")));
        entries.expect_delete_entry().times(0);

        let mut links = MockLinkApi::new();
        links
            .expect_link_entry_to_targets()
            .times(1)
            .returning(|entry_id, target_ids, _| {
                Ok(target_ids
                    .iter()
                    .map(|t| link_doc(entry_id, t))
                    .collect())
            });

        let saga = JournalCreationSaga::new(
            Arc::new(entries),
            Arc::new(links),
            Arc::new(MockTaskApi::new()),
        );

        let id = saga
            .execute(payload(), targets(&["T1", "T2"]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(id, "E1");
    }

    #[tokio::test]
    async fn link_failure_compensates_exactly_once() {
        let mut entries = MockEntryOwnerApi::new();
        entries
            .expect_create_entry()
            .times(1)
            .returning(|_, _| Ok(entry_ref("E1")));
        entries
            .expect_delete_entry()
            .times(1)
            .withf(|id, _| id == "E1")
            .returning(|_, _| Ok(()));

        let mut links = MockLinkApi::new();
        links
            .expect_link_entry_to_targets()
            .times(1)
            .returning(|_, _, _| Err(remote_5xx("link-service")));

        let saga = JournalCreationSaga::new(
            Arc::new(entries),
            Arc::new(links),
            Arc::new(MockTaskApi::new()),
        );

        let err = saga
            .execute(payload(), targets(&["T1"]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::SagaAborted {
                step: SagaStep::LinkTargets,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn entry_failure_never_compensates() {
        let mut entries = MockEntryOwnerApi::new();
        entries
            .expect_create_entry()
            .times(1)
            .returning(|_, _| Err(remote_5xx("journal-service")));
        entries.expect_delete_entry().times(0);

        let mut links = MockLinkApi::new();
        links.expect_link_entry_to_targets().times(0);

        let saga = JournalCreationSaga::new(
            Arc::new(entries),
            Arc::new(links),
            Arc::new(MockTaskApi::new()),
        );

        let err = saga
            .execute(payload(), targets(&["T1"]), &CancellationToken::new())
            .await
            .unwrap_err();
        // Propagated directly, not wrapped as an aborted saga.
        assert!(matches!(err, GatewayError::RemoteInvocation(_)));
    }

    #[tokio::test]
    async fn failed_compensation_still_surfaces_link_failure() {
        let mut entries = MockEntryOwnerApi::new();
        entries
            .expect_create_entry()
            .times(1)
            .returning(|_, _| Ok(entry_ref("E1")));
        entries
            .expect_delete_entry()
            .times(1)
            .returning(|_, _| Err(remote_5xx("journal-service")));

        let mut links = MockLinkApi::new();
        links
            .expect_link_entry_to_targets()
            .times(1)
            .returning(|_, _, _| {
                Err(RemoteError::LinkCountMismatch {
                    service: "link-service",
                    expected: 2,
                    actual: 1,
                })
            });

        let saga = JournalCreationSaga::new(
            Arc::new(entries),
            Arc::new(links),
            Arc::new(MockTaskApi::new()),
        );

        let err = saga
            .execute(payload(), targets(&["T1", "T2"]), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            GatewayError::SagaAborted { step, reason } => {
                assert_eq!(step, SagaStep::LinkTargets);
                assert!(reason.contains("expected 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn compensation_outcome_distinguishes_rollback_from_orphan() {
        let mut rolled_back = MockEntryOwnerApi::new();
        rolled_back
            .expect_delete_entry()
            .times(1)
            .returning(|_, _| Ok(()));
        let saga = JournalCreationSaga::new(
            Arc::new(rolled_back),
            Arc::new(MockLinkApi::new()),
            Arc::new(MockTaskApi::new()),
        );
        assert_eq!(saga.compensate("E1").await, SagaState::RolledBack);

        let mut orphaning = MockEntryOwnerApi::new();
        orphaning
            .expect_delete_entry()
            .times(1)
            .returning(|_, _| Err(remote_5xx("journal-service")));
        let saga = JournalCreationSaga::new(
            Arc::new(orphaning),
            Arc::new(MockLinkApi::new()),
            Arc::new(MockTaskApi::new()),
        );
        assert_eq!(saga.compensate("E1").await, SagaState::CompensationFailed);
    }

    #[tokio::test]
    async fn composed_view_with_no_links_is_empty_not_error() {
        let mut entries = MockEntryOwnerApi::new();
        entries.expect_get_entry().times(1).returning(|id, _| {
            Ok(EntryDetail {
                id: id.to_string(),
                owner_user_id: "user-1".to_string(),
                title: "t".to_string(),
                body: String::new(),
                created_at: Utc::now(),
            })
        });

        let mut links = MockLinkApi::new();
        links.expect_get_links().times(1).returning(|_, _| Ok(Vec::new()));

        let mut tasks = MockTaskApi::new();
        tasks.expect_get_tasks().times(0);

        let saga =
            JournalCreationSaga::new(Arc::new(entries), Arc::new(links), Arc::new(tasks));

        let view = saga
            .composed_view("E1", &CancellationToken::new())
            .await
            .unwrap();
        assert!(view.targets.is_empty());
    }

    #[tokio::test]
    async fn composed_view_batch_fetches_targets() {
        let mut entries = MockEntryOwnerApi::new();
        entries.expect_get_entry().times(1).returning(|id, _| {
            Ok(EntryDetail {
                id: id.to_string(),
                owner_user_id: "user-1".to_string(),
                title: "t".to_string(),
                body: String::new(),
                created_at: Utc::now(),
            })
        });

        let mut links = MockLinkApi::new();
        links
            .expect_get_links()
            .times(1)
            .returning(|owner, _| Ok(vec![link_doc(owner, "T1"), link_doc(owner, "T2")]));

        let mut tasks = MockTaskApi::new();
        tasks
            .expect_get_tasks()
            .times(1)
            .withf(|ids, _| ids == ["T1".to_string(), "T2".to_string()])
            .returning(|ids, _| {
                Ok(ids
                    .iter()
                    .map(|id| TaskSummary {
                        id: id.clone(),
                        title: format!("task {id}"),
                        status: "open".to_string(),
                    })
                    .collect())
            });

        let saga =
            JournalCreationSaga::new(Arc::new(entries), Arc::new(links), Arc::new(tasks));

        let view = saga
            .composed_view("E1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(view.targets.len(), 2);
    }
}

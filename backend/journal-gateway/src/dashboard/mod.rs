//! Composed dashboard read model.
//!
//! Serves a per-subject aggregate composed from the user, journal and task
//! services, behind a TTL-bounded cache. Read-your-writes is NOT guaranteed:
//! a write elsewhere becomes visible after the asynchronous invalidation
//! event arrives or after TTL expiry, whichever comes first.

mod cache;
mod response_cache;

pub use cache::{CacheStats, DashboardCache};
pub use response_cache::TaggedResponseCache;

use chrono::{DateTime, Utc};
use resilience::CancellationToken;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{EntryDetail, EntryOwnerApi, TaskApi, TaskSummary, UserApi, UserProfile};
use crate::error::Result;

/// The composed read model for one subject (a user).
///
/// Owned exclusively by [`DashboardCache`]; replaced wholesale on refresh,
/// never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardAggregate {
    pub subject_id: String,
    pub user: Option<UserProfile>,
    pub entries: Vec<EntryDetail>,
    pub tasks: Vec<TaskSummary>,
    pub fetched_at: DateTime<Utc>,
}

/// Read-through dashboard composition over the downstream services
pub struct DashboardService<E, T, U> {
    cache: Arc<DashboardCache>,
    entries: Arc<E>,
    tasks: Arc<T>,
    users: Arc<U>,
}

impl<E, T, U> DashboardService<E, T, U>
where
    E: EntryOwnerApi,
    T: TaskApi,
    U: UserApi,
{
    pub fn new(cache: Arc<DashboardCache>, entries: Arc<E>, tasks: Arc<T>, users: Arc<U>) -> Self {
        Self {
            cache,
            entries,
            tasks,
            users,
        }
    }

    pub fn cache(&self) -> &Arc<DashboardCache> {
        &self.cache
    }

    /// Serve the subject's aggregate, composing it on a cache miss.
    ///
    /// The three sub-fetches fan out concurrently. Concurrent misses for the
    /// same subject each run their own fan-out; they race to insert and the
    /// last write wins, which is harmless since entries are replaced whole.
    pub async fn get(
        &self,
        subject_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DashboardAggregate> {
        if let Some(aggregate) = self.cache.get(subject_id) {
            debug!(subject_id, "dashboard cache hit");
            return Ok(aggregate);
        }

        let aggregate = self.compose(subject_id, cancel).await?;
        self.cache.insert(aggregate.clone());
        Ok(aggregate)
    }

    /// Compose a fresh aggregate, bypassing the cache entirely
    pub async fn compose(
        &self,
        subject_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DashboardAggregate> {
        let (user, entries, tasks) = tokio::join!(
            self.users.get_user(subject_id, cancel),
            self.entries.entries_by_owner(subject_id, cancel),
            self.tasks.tasks_for_user(subject_id, cancel),
        );

        let aggregate = DashboardAggregate {
            subject_id: subject_id.to_string(),
            user: Some(user?),
            entries: entries?,
            tasks: tasks?,
            fetched_at: Utc::now(),
        };

        info!(
            subject_id,
            entries = aggregate.entries.len(),
            tasks = aggregate.tasks.len(),
            "dashboard aggregate composed"
        );
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockEntryOwnerApi, MockTaskApi, MockUserApi};
    use std::time::Duration;

    fn user(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            display_name: format!("user {id}"),
        }
    }

    fn service(
        ttl: Duration,
        entry_calls: usize,
    ) -> DashboardService<MockEntryOwnerApi, MockTaskApi, MockUserApi> {
        let mut entries = MockEntryOwnerApi::new();
        entries
            .expect_entries_by_owner()
            .times(entry_calls)
            .returning(|_, _| Ok(Vec::new()));

        let mut tasks = MockTaskApi::new();
        tasks
            .expect_tasks_for_user()
            .times(entry_calls)
            .returning(|_, _| Ok(Vec::new()));

        let mut users = MockUserApi::new();
        users
            .expect_get_user()
            .times(entry_calls)
            .returning(|id, _| Ok(user(id)));

        DashboardService::new(
            Arc::new(DashboardCache::new(ttl)),
            Arc::new(entries),
            Arc::new(tasks),
            Arc::new(users),
        )
    }

    #[tokio::test]
    async fn second_get_within_ttl_serves_from_cache() {
        // Downstream mocks tolerate exactly one fan-out.
        let service = service(Duration::from_secs(60), 1);
        let cancel = CancellationToken::new();

        let first = service.get("user-1", &cancel).await.unwrap();
        let second = service.get("user-1", &cancel).await.unwrap();
        assert_eq!(first.fetched_at, second.fetched_at);
    }

    #[tokio::test]
    async fn expired_ttl_triggers_fresh_fan_out() {
        // Two fan-outs expected: TTL of zero expires instantly.
        let service = service(Duration::from_millis(0), 2);
        let cancel = CancellationToken::new();

        service.get("user-1", &cancel).await.unwrap();
        service.get("user-1", &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let service = service(Duration::from_secs(60), 2);
        let cancel = CancellationToken::new();

        service.get("user-1", &cancel).await.unwrap();
        service.cache().invalidate("user-1");
        service.get("user-1", &cancel).await.unwrap();
    }
}

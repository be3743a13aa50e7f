//! Task list query service
//!
//! Every change to the query triggers exactly one fetch. Each fetch is tagged
//! with a sequence number and only the response to the most recent request is
//! applied; anything older is reported as `FetchOutcome::Stale`.

use crate::api::models::TaskPage;
use crate::api::TaskListApi;
use crate::error::Result;
use crate::query::{FilterPatch, FilterUpdate, QueryState, SortField, SortOrder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of a fetch that completed without error
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The response belongs to the latest request and is now current
    Applied(TaskPage),
    /// A newer request was issued while this one was in flight
    Stale,
}

impl FetchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale)
    }

    pub fn page(&self) -> Option<&TaskPage> {
        match self {
            FetchOutcome::Applied(page) => Some(page),
            FetchOutcome::Stale => None,
        }
    }
}

pub struct QueryStateManager<A: TaskListApi> {
    api: Arc<A>,
    state: Mutex<QueryState>,
    latest: AtomicU64,
    current: Mutex<Option<TaskPage>>,
}

impl<A: TaskListApi> QueryStateManager<A> {
    pub fn new(api: Arc<A>, initial: QueryState) -> Self {
        Self {
            api,
            state: Mutex::new(initial),
            latest: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Snapshot of the current query
    pub fn state(&self) -> QueryState {
        self.lock_state().clone()
    }

    /// Last applied page of results
    pub fn current_page(&self) -> Option<TaskPage> {
        self.lock_current().clone()
    }

    pub fn has_active_filters(&self) -> bool {
        self.lock_state().filters.is_active()
    }

    /// Whether the list is narrowed to tasks assigned to `user_id`
    pub fn is_my_tasks(&self, user_id: &str) -> bool {
        self.lock_state().filters.assigned_to.as_deref() == Some(user_id)
    }

    /// Merge `patch` into the filters and go back to page 1
    pub async fn set_filters(&self, patch: FilterPatch) -> Result<FetchOutcome> {
        let snapshot = self.mutate(|state| state.merge_filters(patch));
        self.fetch(snapshot).await
    }

    pub async fn set_sort(&self, sort_by: SortField, order: SortOrder) -> Result<FetchOutcome> {
        let snapshot = self.mutate(|state| state.set_sort(sort_by, order));
        self.fetch(snapshot).await
    }

    /// Jump to `page`; out-of-range pages come back empty from the server
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome> {
        let snapshot = self.mutate(|state| state.set_page(page));
        self.fetch(snapshot).await
    }

    pub async fn set_limit(&self, limit: u32) -> Result<FetchOutcome> {
        let snapshot = {
            let mut state = self.lock_state();
            state.set_limit(limit)?;
            state.clone()
        };
        self.fetch(snapshot).await
    }

    /// Reset filters and sort, keeping the page size
    pub async fn clear(&self) -> Result<FetchOutcome> {
        let snapshot = self.mutate(QueryState::reset);
        self.fetch(snapshot).await
    }

    /// Refetch the current query
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        let snapshot = self.state();
        self.fetch(snapshot).await
    }

    /// Show only my tasks, or drop that filter when it is already on
    pub async fn toggle_my_tasks(&self, user_id: &str) -> Result<FetchOutcome> {
        let update = if self.is_my_tasks(user_id) {
            FilterUpdate::Clear
        } else {
            FilterUpdate::Set(user_id.to_string())
        };
        self.set_filters(FilterPatch::assigned_to(update)).await
    }

    /// Drop the current page and go back to the default query without
    /// fetching; responses still in flight become stale
    pub fn reset(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.lock_state().reset();
        *self.lock_current() = None;
        tracing::debug!("Task list query reset");
    }

    fn mutate(&self, change: impl FnOnce(&mut QueryState)) -> QueryState {
        let mut state = self.lock_state();
        change(&mut state);
        state.clone()
    }

    async fn fetch(&self, query: QueryState) -> Result<FetchOutcome> {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Fetching tasks #{} (page {})", seq, query.page());

        let result = self.api.list_tasks(&query).await;

        if self.latest.load(Ordering::SeqCst) != seq {
            tracing::debug!("Discarding response to superseded request #{}", seq);
            return Ok(FetchOutcome::Stale);
        }

        let page = result?;
        tracing::debug!(
            "Applied #{}: {} task(s), {} total",
            seq,
            page.data.len(),
            page.meta.total
        );
        *self.lock_current() = Some(page.clone());
        Ok(FetchOutcome::Applied(page))
    }

    fn lock_state(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<TaskPage>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{PaginationMeta, TaskStatus};
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    /// Records every query; answers immediately unless a gate is queued
    #[derive(Default)]
    struct FakeTasks {
        seen: Mutex<Vec<QueryState>>,
        gates: Mutex<VecDeque<oneshot::Receiver<Result<TaskPage>>>>,
    }

    impl FakeTasks {
        fn gate(&self) -> oneshot::Sender<Result<TaskPage>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }

        fn seen(&self) -> Vec<QueryState> {
            self.seen.lock().unwrap().clone()
        }
    }

    fn page_of(page: u32, total: u64) -> TaskPage {
        TaskPage {
            data: Vec::new(),
            meta: PaginationMeta {
                page,
                limit: 12,
                total,
                total_pages: (total as u32).div_ceil(12),
            },
        }
    }

    #[async_trait]
    impl TaskListApi for FakeTasks {
        async fn list_tasks(&self, query: &QueryState) -> Result<TaskPage> {
            self.seen.lock().unwrap().push(query.clone());
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(AppError::Fetch("gate dropped".to_string()))),
                None => Ok(page_of(query.page(), 40)),
            }
        }
    }

    fn manager() -> (QueryStateManager<FakeTasks>, Arc<FakeTasks>) {
        let api = Arc::new(FakeTasks::default());
        (QueryStateManager::new(api.clone(), QueryState::default()), api)
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let (manager, api) = manager();
        manager.set_page(3).await.unwrap();

        manager
            .set_filters(FilterPatch::status(Some(TaskStatus::Done)))
            .await
            .unwrap();

        let state = manager.state();
        assert_eq!(state.page(), 1);
        assert_eq!(state.filters.status, Some(TaskStatus::Done));
        assert_eq!(api.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_page_change_preserves_filters() {
        let (manager, api) = manager();
        manager.set_filters(FilterPatch::search("invoice")).await.unwrap();

        let outcome = manager.set_page(2).await.unwrap();

        assert_eq!(outcome.page().unwrap().meta.page, 2);
        let last = api.seen().pop().unwrap();
        assert_eq!(last.filters.search.as_deref(), Some("invoice"));
        assert_eq!(last.page(), 2);
    }

    #[tokio::test]
    async fn test_clear_preserves_limit() {
        let api = Arc::new(FakeTasks::default());
        let manager = QueryStateManager::new(api.clone(), QueryState::new(25).unwrap());
        manager.set_sort(SortField::Title, SortOrder::Asc).await.unwrap();
        manager.set_filters(FilterPatch::search("x")).await.unwrap();

        manager.clear().await.unwrap();

        assert_eq!(manager.state(), QueryState::new(25).unwrap());
        assert!(!manager.has_active_filters());
    }

    #[tokio::test]
    async fn test_set_limit_rejects_zero_without_fetch() {
        let (manager, api) = manager();

        let result = manager.set_limit(0).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(api.seen().is_empty());

        manager.set_page(4).await.unwrap();
        manager.set_limit(50).await.unwrap();
        assert_eq!(manager.state().limit(), 50);
        assert_eq!(manager.state().page(), 1);
    }

    #[tokio::test]
    async fn test_toggle_my_tasks_twice() {
        let (manager, _api) = manager();

        manager.toggle_my_tasks("u1").await.unwrap();
        assert!(manager.is_my_tasks("u1"));
        assert!(!manager.is_my_tasks("u2"));

        manager.toggle_my_tasks("u1").await.unwrap();
        assert_eq!(manager.state().filters.assigned_to, None);
        assert!(!manager.has_active_filters());
    }

    #[tokio::test]
    async fn test_reset_forgets_page_and_filters() {
        let api = Arc::new(FakeTasks::default());
        let manager = QueryStateManager::new(api.clone(), QueryState::new(30).unwrap());
        manager.toggle_my_tasks("u1").await.unwrap();
        assert!(manager.current_page().is_some());

        manager.reset();

        assert!(manager.current_page().is_none());
        assert!(!manager.is_my_tasks("u1"));
        assert_eq!(manager.state(), QueryState::new(30).unwrap());
        assert_eq!(api.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_makes_in_flight_response_stale() {
        let (manager, api) = manager();
        let gate = api.gate();

        let pending = manager.set_filters(FilterPatch::search("secret"));
        let interrupt = async {
            tokio::task::yield_now().await;
            manager.reset();
            gate.send(Ok(page_of(1, 3))).unwrap();
        };
        let (pending, _) = tokio::join!(pending, interrupt);

        assert!(pending.unwrap().is_stale());
        assert!(manager.current_page().is_none());
    }

    #[tokio::test]
    async fn test_each_mutation_fetches_once() {
        let (manager, api) = manager();

        manager.set_filters(FilterPatch::search("a")).await.unwrap();
        manager.set_sort(SortField::DueDate, SortOrder::Asc).await.unwrap();
        manager.set_page(2).await.unwrap();
        manager.clear().await.unwrap();
        manager.refresh().await.unwrap();

        assert_eq!(api.seen().len(), 5);
    }

    #[tokio::test]
    async fn test_last_request_wins() {
        let (manager, api) = manager();
        let first = api.gate();
        let second = api.gate();

        let slow = manager.set_filters(FilterPatch::search("old"));
        let fast = manager.set_filters(FilterPatch::search("new"));
        let release = async {
            tokio::task::yield_now().await;
            second.send(Ok(page_of(1, 5))).unwrap();
            tokio::task::yield_now().await;
            first.send(Ok(page_of(1, 99))).unwrap();
        };

        let (slow, fast, _) = tokio::join!(slow, fast, release);

        assert!(slow.unwrap().is_stale());
        assert_eq!(fast.unwrap().page().unwrap().meta.total, 5);
        assert_eq!(manager.current_page().unwrap().meta.total, 5);
    }

    #[tokio::test]
    async fn test_stale_error_is_discarded() {
        let (manager, api) = manager();
        let first = api.gate();
        let second = api.gate();

        let slow = manager.set_page(2);
        let fast = manager.set_page(3);
        let release = async {
            tokio::task::yield_now().await;
            first
                .send(Err(AppError::Fetch("503 Service Unavailable".to_string())))
                .unwrap();
            second.send(Ok(page_of(3, 40))).unwrap();
        };

        let (slow, fast, _) = tokio::join!(slow, fast, release);

        assert!(matches!(slow, Ok(FetchOutcome::Stale)));
        assert_eq!(fast.unwrap().page().unwrap().meta.page, 3);
    }

    #[tokio::test]
    async fn test_latest_error_surfaces_and_keeps_page() {
        let (manager, api) = manager();
        manager.refresh().await.unwrap();

        let gate = api.gate();
        gate.send(Err(AppError::Fetch("timeout".to_string()))).unwrap();
        let result = manager.set_page(2).await;

        assert!(matches!(result, Err(AppError::Fetch(_))));
        assert_eq!(manager.current_page().unwrap().meta.page, 1);
        assert_eq!(manager.state().page(), 2);
    }
}

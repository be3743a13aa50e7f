//! Integration tests for the TaskDesk client
//!
//! These tests drive the public services end to end against in-memory
//! implementations of the API traits:
//! - Session restore across a simulated restart
//! - Forced sign-out on a rejected token
//! - Confirmed-only comment collections
//! - Query paging with the page window and trend bucketing

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use taskdesk::api::{
    AuthApi, AuthTokens, Comment, PaginationMeta, ScopedCollection, ScopedUpdate, TaskListApi, TaskPage,
    TrendPoint, User,
};
use taskdesk::error::{AppError, Result};
use taskdesk::pagination::{window_default, PageItem};
use taskdesk::query::{FilterPatch, QueryState};
use taskdesk::services::{FetchOutcome, ListCache, QueryStateManager, SessionManager};
use taskdesk::session::{AuthStatus, SessionState};
use taskdesk::storage::{FileStore, MemoryStore, TokenStore};
use taskdesk::trends::aggregate;
use tempfile::TempDir;
use tokio::sync::oneshot;

fn ada() -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        avatar: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Accepts one password and any non-empty token
struct FakeAuth {
    store: Arc<dyn TokenStore>,
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, _email: &str, password: &str) -> Result<AuthTokens> {
        if password != "secret" {
            return Err(AppError::Auth("Invalid email or password".to_string()));
        }
        Ok(AuthTokens {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "bearer".to_string(),
        })
    }

    async fn register(&self, _name: &str, _email: &str, _password: &str) -> Result<AuthTokens> {
        Err(AppError::Validation("Email already registered".to_string()))
    }

    async fn me(&self) -> Result<User> {
        match self.store.get("access_token")? {
            Some(token) if token == "access-1" => Ok(ada()),
            _ => Err(AppError::Auth("Invalid token".to_string())),
        }
    }
}

fn session_over(store: Arc<dyn TokenStore>) -> SessionManager<FakeAuth> {
    let api = Arc::new(FakeAuth { store: store.clone() });
    SessionManager::new(api, Arc::new(SessionState::new(store)))
}

#[tokio::test]
async fn test_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    // First run: sign in
    let first = session_over(Arc::new(FileStore::in_dir(temp_dir.path())));
    first.login("ada@example.com", "secret").await.unwrap();
    assert!(first.state().is_authenticated());
    drop(first);

    // Second run: the token file restores the session
    let second = session_over(Arc::new(FileStore::in_dir(temp_dir.path())));
    assert_eq!(second.restore().await, AuthStatus::Authenticated);
    assert_eq!(second.state().current_user().unwrap().email, "ada@example.com");

    // Sign out, then a third run has nothing to restore
    second.logout();
    let third = session_over(Arc::new(FileStore::in_dir(temp_dir.path())));
    assert_eq!(third.restore().await, AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_rejected_token_signs_out_once() {
    let store = Arc::new(MemoryStore::new());
    let manager = session_over(store.clone());
    manager.login("ada@example.com", "secret").await.unwrap();
    let mut status = manager.state().subscribe();
    status.borrow_and_update();

    // Three in-flight requests all come back 401
    let announced = (0..3).filter(|_| manager.state().invalidate()).count();

    assert_eq!(announced, 1);
    assert!(store.is_empty());
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), AuthStatus::Unauthenticated);
    assert!(!status.has_changed().unwrap());
}

fn comment(id: &str, content: &str) -> Comment {
    let now = Utc::now();
    Comment {
        id: id.to_string(),
        content: content.to_string(),
        task_id: "t1".to_string(),
        user_id: "u1".to_string(),
        created_at: now,
        updated_at: now,
        user: None,
    }
}

/// Comment backend whose creates wait for the test to release them
#[derive(Default)]
struct GatedComments {
    rows: Mutex<HashMap<String, Vec<Comment>>>,
    pending: Mutex<Option<oneshot::Receiver<Result<Comment>>>>,
}

#[async_trait]
impl ScopedCollection for GatedComments {
    type Item = Comment;
    type Input = String;

    async fn list(&self, scope: &str) -> Result<Vec<Comment>> {
        Ok(self.rows.lock().unwrap().get(scope).cloned().unwrap_or_default())
    }

    async fn create(&self, scope: &str, _content: String) -> Result<Vec<Comment>> {
        let gate = self.pending.lock().unwrap().take();
        let created = match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AppError::Mutation("gate dropped".to_string())))?,
            None => return Err(AppError::Mutation("no gate".to_string())),
        };
        self.rows
            .lock()
            .unwrap()
            .entry(scope.to_string())
            .or_default()
            .push(created.clone());
        Ok(vec![created])
    }

    async fn delete(&self, _scope: &str, _id: &str) -> Result<()> {
        Err(AppError::Delete("403 Forbidden".to_string()))
    }
}

#[async_trait]
impl ScopedUpdate for GatedComments {
    type Patch = String;

    async fn update(&self, _scope: &str, id: &str, content: String) -> Result<Comment> {
        let mut echoed = comment(id, content.trim());
        echoed.updated_at = echoed.created_at + Duration::seconds(5);
        Ok(echoed)
    }
}

#[tokio::test]
async fn test_comment_appears_only_after_confirmation() {
    let backend = Arc::new(GatedComments::default());
    backend
        .rows
        .lock()
        .unwrap()
        .insert("t1".to_string(), vec![comment("c1", "first")]);
    let cache = ListCache::new(backend.clone());
    cache.load("t1").await.unwrap();

    let (tx, rx) = oneshot::channel();
    *backend.pending.lock().unwrap() = Some(rx);

    let insert = cache.insert("t1", "second".to_string());
    let observe = async {
        tokio::task::yield_now().await;
        // Request is in flight: nothing new is visible yet
        let during = cache.len("t1");
        tx.send(Ok(comment("c2", "second"))).unwrap();
        during
    };
    let (inserted, during) = tokio::join!(insert, observe);

    assert_eq!(during, 1);
    assert_eq!(inserted.unwrap()[0].id, "c2");
    let ids: Vec<String> = cache.items("t1").into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["c1", "c2"]);

    let edited = cache.update("t1", "c2", "  second, edited ".to_string()).await.unwrap();
    assert!(edited.is_edited());
    assert_eq!(cache.get("t1", "c2").unwrap().content, "second, edited");

    let denied = cache.delete("t1", "c1").await;
    assert!(matches!(denied, Err(AppError::Delete(_))));
    assert_eq!(cache.len("t1"), 2);
}

/// Fifty tasks, answered page by page
struct PagedTasks;

#[async_trait]
impl TaskListApi for PagedTasks {
    async fn list_tasks(&self, query: &QueryState) -> Result<TaskPage> {
        let total = if query.filters.search.is_some() { 3 } else { 50 };
        Ok(TaskPage {
            data: Vec::new(),
            meta: PaginationMeta {
                page: query.page(),
                limit: query.limit(),
                total,
                total_pages: (total as u32).div_ceil(query.limit()),
            },
        })
    }
}

#[tokio::test]
async fn test_paging_through_task_list() {
    let manager = QueryStateManager::new(Arc::new(PagedTasks), QueryState::new(5).unwrap());

    let page = match manager.set_page(6).await.unwrap() {
        FetchOutcome::Applied(page) => page,
        FetchOutcome::Stale => panic!("single request cannot be stale"),
    };
    assert_eq!(
        window_default(page.meta.page, page.meta.total_pages),
        vec![
            PageItem::Page(1),
            PageItem::Ellipsis,
            PageItem::Page(5),
            PageItem::Page(6),
            PageItem::Page(7),
            PageItem::Ellipsis,
            PageItem::Page(10),
        ]
    );

    let narrowed = manager.set_filters(FilterPatch::search("bug")).await.unwrap();
    let meta = narrowed.page().unwrap().meta;
    assert_eq!(meta.page, 1);
    assert_eq!(window_default(meta.page, meta.total_pages), vec![PageItem::Page(1)]);
}

#[test]
fn test_quarter_trends_bucket_weekly() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let daily: Vec<TrendPoint> = (0..90)
        .map(|i| TrendPoint {
            date: start + Duration::days(i),
            created: 2,
            completed: 1,
        })
        .collect();

    let weekly = aggregate(&daily, 90);

    assert_eq!(weekly.len(), 13);
    assert_eq!(weekly[1].date, start + Duration::days(7));
    assert_eq!(weekly[1].created, 14);
    assert_eq!(weekly[12].completed, 6);
    assert_eq!(aggregate(&daily[..30], 30).len(), 30);
}

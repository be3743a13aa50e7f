//! Application state and initialization
//!
//! Every service shares one `SessionState` and one `ApiClient`. `AppState`
//! wires them together once; front ends hold a clone of it.

use crate::api::{ApiClient, CommentsApi, FilesApi};
use crate::config::{self, ClientConfig};
use crate::error::Result;
use crate::query::QueryState;
use crate::services::{AnalyticsService, ListCache, QueryStateManager, SessionManager, TasksService};
use crate::session::SessionState;
use crate::storage::{FileStore, TokenStore};
use std::path::PathBuf;
use std::sync::{Arc, Weak};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub session: Arc<SessionState>,
    pub client: ApiClient,
    pub auth: Arc<SessionManager<ApiClient>>,
    pub tasks_query: Arc<QueryStateManager<ApiClient>>,
    pub tasks: Arc<TasksService<ApiClient>>,
    pub comments: Arc<ListCache<CommentsApi>>,
    pub files: Arc<ListCache<FilesApi>>,
    pub analytics: Arc<AnalyticsService<ApiClient>>,
}

impl AppState {
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Arc::new(SessionState::new(store));
        let client = ApiClient::new(&config, session.clone())?;
        let api = Arc::new(client.clone());

        let state = Self {
            auth: Arc::new(SessionManager::new(api.clone(), session.clone())),
            tasks_query: Arc::new(QueryStateManager::new(api.clone(), QueryState::default())),
            tasks: Arc::new(TasksService::new(api.clone())),
            comments: Arc::new(ListCache::new(Arc::new(CommentsApi::new(client.clone())))),
            files: Arc::new(ListCache::new(Arc::new(FilesApi::new(client.clone())))),
            analytics: Arc::new(AnalyticsService::new(api)),
            config,
            session,
            client,
        };

        // Weak handles: the services own the session through the client
        let tasks_query = Arc::downgrade(&state.tasks_query);
        let comments = Arc::downgrade(&state.comments);
        let files = Arc::downgrade(&state.files);
        state
            .session
            .on_sign_out(move || forget_user_data(&tasks_query, &comments, &files));

        Ok(state)
    }

    /// Sign out and forget everything loaded for the previous user
    pub fn logout(&self) {
        self.auth.logout();
        self.tasks_query.reset();
        self.comments.clear();
        self.files.clear();
    }
}

fn forget_user_data(
    tasks_query: &Weak<QueryStateManager<ApiClient>>,
    comments: &Weak<ListCache<CommentsApi>>,
    files: &Weak<ListCache<FilesApi>>,
) {
    tracing::debug!("Signed out, dropping cached task data");
    if let Some(tasks_query) = tasks_query.upgrade() {
        tasks_query.reset();
    }
    if let Some(comments) = comments.upgrade() {
        comments.clear();
    }
    if let Some(files) = files.upgrade() {
        files.clear();
    }
}

/// Resolve the data directory, load the config and open the token file
pub fn setup() -> Result<AppState> {
    tracing::info!("Initializing client");

    let app_data_dir = config::app_data_dir()?;
    tracing::info!("App data directory: {:?}", app_data_dir);

    setup_in(app_data_dir)
}

/// Same as `setup` with an explicit data directory
pub fn setup_in(app_data_dir: PathBuf) -> Result<AppState> {
    std::fs::create_dir_all(&app_data_dir)?;

    let config = ClientConfig::load(&app_data_dir.join("config.json"))?;
    let store = Arc::new(FileStore::in_dir(&app_data_dir));

    let state = AppState::new(config, store)?;
    tracing::info!("Client initialized successfully");
    Ok(state)
}

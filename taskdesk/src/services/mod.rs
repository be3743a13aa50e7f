//! Services module
//!
//! Stateful services that coordinate between callers and the API traits.

pub mod analytics;
pub mod list_cache;
pub mod query;
pub mod session;
pub mod tasks;

pub use analytics::{format_duration, AnalyticsService};
pub use list_cache::ListCache;
pub use query::{FetchOutcome, QueryStateManager};
pub use session::SessionManager;
pub use tasks::TasksService;

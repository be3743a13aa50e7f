//! Task service API
//!
//! The traits in this module are the seams the services depend on;
//! `ApiClient` implements them over HTTP, tests implement them in memory.

pub mod analytics;
pub mod auth;
pub mod client;
pub mod collection;
pub mod comments;
pub mod files;
pub mod models;
pub mod tasks;
#[cfg(test)]
pub(crate) mod test_server;

pub use analytics::AnalyticsApi;
pub use auth::AuthApi;
pub use client::{ApiClient, RequestKind};
pub use collection::{ListEntity, ScopedCollection, ScopedUpdate};
pub use comments::CommentsApi;
pub use files::FilesApi;
pub use models::*;
pub use tasks::{TaskApi, TaskListApi};

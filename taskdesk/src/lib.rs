//! TaskDesk client library
//!
//! Session handling, task list queries, per-task comment and file
//! collections, and analytics for the TaskDesk task-tracking service.
//! Front ends build an `app::AppState` and drive its services.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod pagination;
pub mod query;
pub mod services;
pub mod session;
pub mod storage;
pub mod trends;

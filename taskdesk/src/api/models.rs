//! API models
//!
//! Rust structs mirroring the task service's JSON payloads.
//! All models use serde for (de)serialization on both sides of the wire.

use super::collection::ListEntity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A user profile as returned by `/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Token pair issued by login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task with its optional embedded relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    #[serde(default)]
    pub files: Option<Vec<FileAttachment>>,
}

impl Task {
    /// Past due and not yet done
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < now)
    }

    /// The creator and the assignee may edit a task
    pub fn is_editable_by(&self, user_id: &str) -> bool {
        self.created_by == user_id || self.assigned_to.as_deref() == Some(user_id)
    }

    /// Only the creator may delete a task
    pub fn is_deletable_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}

/// Create task request
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

/// Update task request; unset fields are left untouched by the server
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

/// Comment on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub task_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Comment {
    /// Only the author gets edit/delete controls
    pub fn is_editable_by(&self, user_id: &str) -> bool {
        self.is_owned_by(user_id)
    }

    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}

/// File attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub task_id: String,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub uploader: Option<User>,
}

impl FileAttachment {
    /// The uploader and the task's creator may remove a file
    pub fn is_deletable_by(&self, user_id: &str, task_creator_id: &str) -> bool {
        self.is_owned_by(user_id) || task_creator_id == user_id
    }

    /// Size formatted as B, KB or MB
    pub fn human_size(&self) -> String {
        let bytes = self.size;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

impl ListEntity for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.task_id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl ListEntity for FileAttachment {
    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.task_id
    }

    fn owner_id(&self) -> &str {
        &self.uploaded_by
    }
}

/// A file to upload
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Server-side pagination info for a page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of tasks with its pagination info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub data: Vec<Task>,
    pub meta: PaginationMeta,
}

/// Task counts for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewData {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
    pub by_priority: HashMap<String, u64>,
    pub overdue: u64,
}

/// Per-user completion statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceData {
    pub user_id: String,
    pub user_name: String,
    pub completed_tasks: u64,
    /// Average hours from creation to completion
    pub avg_completion_time: f64,
}

/// Tasks created and completed on one day (or in one bucket)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub created: u32,
    pub completed: u32,
}

/// `{ success, data }` envelope around every JSON response
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// `{ success: false, error: { message, code } }` body of failed requests
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ErrorDetail,
}

//! Comment endpoints, exposed as a scoped collection keyed by task id

use super::client::{ApiClient, RequestKind};
use super::collection::{ScopedCollection, ScopedUpdate};
use super::models::Comment;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Comments of a task
#[derive(Clone)]
pub struct CommentsApi {
    client: ApiClient,
}

impl CommentsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct CommentBody<'a> {
    content: &'a str,
}

fn validate_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("comment cannot be empty".to_string()));
    }
    Ok(content)
}

#[async_trait]
impl ScopedCollection for CommentsApi {
    type Item = Comment;
    type Input = String;

    async fn list(&self, task_id: &str) -> Result<Vec<Comment>> {
        let path = format!("/tasks/{}/comments/", task_id);
        self.client
            .data(self.client.get(&path), RequestKind::Read)
            .await
    }

    async fn create(&self, task_id: &str, content: String) -> Result<Vec<Comment>> {
        let body = CommentBody {
            content: validate_content(&content)?,
        };
        let path = format!("/tasks/{}/comments/", task_id);
        let comment: Comment = self
            .client
            .data(self.client.post(&path).json(&body), RequestKind::Write)
            .await?;
        Ok(vec![comment])
    }

    async fn delete(&self, task_id: &str, comment_id: &str) -> Result<()> {
        let path = format!("/tasks/{}/comments/{}", task_id, comment_id);
        self.client
            .send(self.client.delete(&path), RequestKind::Delete)
            .await
    }
}

#[async_trait]
impl ScopedUpdate for CommentsApi {
    type Patch = String;

    async fn update(&self, task_id: &str, comment_id: &str, content: String) -> Result<Comment> {
        let body = CommentBody {
            content: validate_content(&content)?,
        };
        let path = format!("/tasks/{}/comments/{}", task_id, comment_id);
        self.client
            .data(self.client.put(&path).json(&body), RequestKind::Write)
            .await
    }
}

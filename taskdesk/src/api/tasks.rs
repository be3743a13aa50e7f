//! Task endpoints

use super::client::{ApiClient, RequestKind};
use super::models::{NewTask, Task, TaskPage, TaskPatch, User};
use crate::error::Result;
use crate::query::QueryState;
use async_trait::async_trait;

/// Paged task listing, the only collaborator of `QueryStateManager`
#[async_trait]
pub trait TaskListApi: Send + Sync {
    async fn list_tasks(&self, query: &QueryState) -> Result<TaskPage>;
}

/// Single-task CRUD and the user directory
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn get_task(&self, id: &str) -> Result<Task>;

    async fn create_task(&self, task: &NewTask) -> Result<Task>;

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task>;

    async fn delete_task(&self, id: &str) -> Result<()>;

    async fn bulk_create_tasks(&self, tasks: &[NewTask]) -> Result<Vec<Task>>;

    /// Users tasks can be assigned to
    async fn list_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
impl TaskListApi for ApiClient {
    async fn list_tasks(&self, query: &QueryState) -> Result<TaskPage> {
        let params = query.to_params();
        tracing::debug!("Listing tasks: {:?}", params);
        self.body(self.get("/tasks/").query(&params), RequestKind::Read)
            .await
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn get_task(&self, id: &str) -> Result<Task> {
        self.data(self.get(&format!("/tasks/{}", id)), RequestKind::Read)
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        self.data(self.post("/tasks/").json(task), RequestKind::Write)
            .await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        self.data(self.put(&format!("/tasks/{}", id)).json(patch), RequestKind::Write)
            .await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.send(self.delete(&format!("/tasks/{}", id)), RequestKind::Delete)
            .await
    }

    async fn bulk_create_tasks(&self, tasks: &[NewTask]) -> Result<Vec<Task>> {
        self.data(self.post("/tasks/bulk").json(tasks), RequestKind::Write)
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.data(self.get("/tasks/users"), RequestKind::Read).await
    }
}

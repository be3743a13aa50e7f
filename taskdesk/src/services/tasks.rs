//! Task service
//!
//! Single-task operations outside the paged list: detail, create, update,
//! delete, bulk import and the assignee directory.

use crate::api::models::{NewTask, Task, TaskPatch, TaskStatus, User};
use crate::api::TaskApi;
use crate::config::MAX_TITLE_LENGTH;
use crate::error::{AppError, Result};
use std::sync::Arc;

pub struct TasksService<A: TaskApi> {
    api: Arc<A>,
}

impl<A: TaskApi> TasksService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn get(&self, id: &str) -> Result<Task> {
        tracing::debug!("Loading task {}", id);
        self.api.get_task(id).await
    }

    pub async fn create(&self, task: NewTask) -> Result<Task> {
        let task = normalize_new(task)?;
        tracing::info!("Creating task: {}", task.title);

        let created = self.api.create_task(&task).await?;
        tracing::info!("Task created: {}", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let patch = normalize_patch(patch)?;
        tracing::info!("Updating task {}", id);
        self.api.update_task(id, &patch).await
    }

    /// Move a task to another column of the board
    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        tracing::info!("Task {} -> {}", id, status);
        let patch = TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        };
        self.api.update_task(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting task {}", id);
        self.api.delete_task(id).await
    }

    /// Create several tasks in one request; any invalid title rejects the batch
    pub async fn bulk_create(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>> {
        if tasks.is_empty() {
            return Err(AppError::Validation("no tasks to create".to_string()));
        }
        let tasks = tasks
            .into_iter()
            .map(normalize_new)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Bulk creating {} task(s)", tasks.len());
        self.api.bulk_create_tasks(&tasks).await
    }

    /// Users a task can be assigned to
    pub async fn users(&self) -> Result<Vec<User>> {
        self.api.list_users().await
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_new(mut task: NewTask) -> Result<NewTask> {
    task.title = validate_title(&task.title)?;
    task.tags = task.tags.map(clean_tags);
    Ok(task)
}

fn normalize_patch(mut patch: TaskPatch) -> Result<TaskPatch> {
    if let Some(title) = &patch.title {
        patch.title = Some(validate_title(title)?);
    }
    patch.tags = patch.tags.map(clean_tags);
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::TaskPriority;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTasks {
        created: Mutex<Vec<NewTask>>,
        patches: Mutex<Vec<(String, TaskPatch)>>,
    }

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            tags: None,
            assigned_to: None,
            created_by: "u1".to_string(),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            creator: None,
            assignee: None,
            comments: None,
            files: None,
        }
    }

    #[async_trait]
    impl TaskApi for FakeTasks {
        async fn get_task(&self, id: &str) -> Result<Task> {
            Ok(task(id, "existing"))
        }

        async fn create_task(&self, new: &NewTask) -> Result<Task> {
            self.created.lock().unwrap().push(new.clone());
            let mut created = task("t-new", &new.title);
            created.tags = new.tags.clone();
            Ok(created)
        }

        async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
            self.patches
                .lock()
                .unwrap()
                .push((id.to_string(), patch.clone()));
            let mut updated = task(id, "existing");
            if let Some(status) = patch.status {
                updated.status = status;
            }
            Ok(updated)
        }

        async fn delete_task(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn bulk_create_tasks(&self, tasks: &[NewTask]) -> Result<Vec<Task>> {
            Ok(tasks
                .iter()
                .enumerate()
                .map(|(i, t)| task(&format!("t{}", i), &t.title))
                .collect())
        }

        async fn list_users(&self) -> Result<Vec<User>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_create_trims_title_and_tags() {
        let api = Arc::new(FakeTasks::default());
        let service = TasksService::new(api.clone());

        let created = service
            .create(NewTask {
                title: "  Ship release  ".to_string(),
                tags: Some(vec![" ops ".to_string(), "".to_string(), "q3".to_string()]),
                ..NewTask::default()
            })
            .await
            .unwrap();

        assert_eq!(created.title, "Ship release");
        assert_eq!(created.tags, Some(vec!["ops".to_string(), "q3".to_string()]));
    }

    #[tokio::test]
    async fn test_invalid_title_never_reaches_server() {
        let api = Arc::new(FakeTasks::default());
        let service = TasksService::new(api.clone());

        let blank = service
            .create(NewTask {
                title: "   ".to_string(),
                ..NewTask::default()
            })
            .await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let long = service
            .create(NewTask {
                title: "x".repeat(MAX_TITLE_LENGTH + 1),
                ..NewTask::default()
            })
            .await;
        assert!(matches!(long, Err(AppError::Validation(_))));

        let patch = service
            .update(
                "t1",
                TaskPatch {
                    title: Some(String::new()),
                    ..TaskPatch::default()
                },
            )
            .await;
        assert!(matches!(patch, Err(AppError::Validation(_))));

        assert!(api.created.lock().unwrap().is_empty());
        assert!(api.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_sends_only_status() {
        let api = Arc::new(FakeTasks::default());
        let service = TasksService::new(api.clone());

        let updated = service.set_status("t7", TaskStatus::Done).await.unwrap();

        assert_eq!(updated.status, TaskStatus::Done);
        let patches = api.patches.lock().unwrap();
        assert_eq!(patches[0].0, "t7");
        assert_eq!(
            serde_json::to_string(&patches[0].1).unwrap(),
            r#"{"status":"DONE"}"#
        );
    }

    #[tokio::test]
    async fn test_bulk_create_validates_every_title() {
        let service = TasksService::new(Arc::new(FakeTasks::default()));

        let empty = service.bulk_create(Vec::new()).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let batch = vec![
            NewTask {
                title: "one".to_string(),
                ..NewTask::default()
            },
            NewTask {
                title: " ".to_string(),
                ..NewTask::default()
            },
        ];
        assert!(service.bulk_create(batch).await.is_err());

        let batch = vec![
            NewTask {
                title: "one".to_string(),
                ..NewTask::default()
            },
            NewTask {
                title: "two".to_string(),
                ..NewTask::default()
            },
        ];
        assert_eq!(service.bulk_create(batch).await.unwrap().len(), 2);
    }
}

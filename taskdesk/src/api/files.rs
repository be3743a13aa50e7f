//! File attachment endpoints, exposed as a scoped collection keyed by task id

use super::client::{ApiClient, RequestKind};
use super::collection::ScopedCollection;
use super::models::{FileAttachment, FileUpload, Task};
use crate::config::MAX_FILENAME_LENGTH;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

/// Files attached to a task
#[derive(Clone)]
pub struct FilesApi {
    client: ApiClient,
}

impl FilesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Raw content of a stored file
    pub async fn download(&self, task_id: &str, file_id: &str) -> Result<Vec<u8>> {
        tracing::info!("Downloading file {} of task {}", file_id, task_id);
        let path = format!("/tasks/{}/files/{}", task_id, file_id);
        self.client
            .bytes(self.client.get(&path), RequestKind::Read)
            .await
    }
}

fn upload_form(files: Vec<FileUpload>) -> Result<Form> {
    let mut form = Form::new();
    for file in files {
        let name = sanitize_filename(&file.name)
            .ok_or_else(|| AppError::Validation(format!("invalid file name {:?}", file.name)))?;
        let part = Part::bytes(file.bytes)
            .file_name(name)
            .mime_str(&file.mime_type)
            .map_err(|e| AppError::Validation(format!("invalid MIME type {:?}: {}", file.mime_type, e)))?;
        form = form.part("files", part);
    }
    Ok(form)
}

#[async_trait]
impl ScopedCollection for FilesApi {
    type Item = FileAttachment;
    type Input = Vec<FileUpload>;

    async fn list(&self, task_id: &str) -> Result<Vec<FileAttachment>> {
        // No listing route exists; files arrive embedded in the task detail
        let path = format!("/tasks/{}", task_id);
        let task: Task = self
            .client
            .data(self.client.get(&path), RequestKind::Read)
            .await?;
        Ok(task.files.unwrap_or_default())
    }

    async fn create(&self, task_id: &str, files: Vec<FileUpload>) -> Result<Vec<FileAttachment>> {
        if files.is_empty() {
            return Err(AppError::Validation("no files selected".to_string()));
        }

        let total: usize = files.iter().map(|f| f.bytes.len()).sum();
        tracing::info!(
            "Uploading {} file(s) to task {} ({} bytes)",
            files.len(),
            task_id,
            total
        );

        let form = upload_form(files)?;
        let path = format!("/tasks/{}/files/", task_id);
        self.client
            .data(self.client.post(&path).multipart(form), RequestKind::Write)
            .await
    }

    async fn delete(&self, task_id: &str, file_id: &str) -> Result<()> {
        let path = format!("/tasks/{}/files/{}", task_id, file_id);
        self.client
            .send(self.client.delete(&path), RequestKind::Delete)
            .await
    }
}

/// Server-safe upload name: the final path component without leading dots
/// or NUL bytes, at most 255 characters. `None` when nothing usable remains.
fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .last()?;

    let name: String = base
        .chars()
        .filter(|c| *c != '\0' && !c.is_control())
        .skip_while(|c| *c == '.')
        .take(MAX_FILENAME_LENGTH)
        .collect();
    let name = name.trim();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return None;
    }
    Some(name.to_string())
}

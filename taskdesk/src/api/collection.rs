//! Per-task sub-collections (comments, files)

use crate::error::Result;
use async_trait::async_trait;

/// An item living inside a parent scope
pub trait ListEntity: Clone + Send + Sync + 'static {
    /// Stable id, unique within the scope
    fn id(&self) -> &str;

    /// Id of the parent task
    fn scope_id(&self) -> &str;

    /// Author or uploader
    fn owner_id(&self) -> &str;

    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id() == user_id
    }
}

/// Server-side collection that can be listed, appended to and deleted from
#[async_trait]
pub trait ScopedCollection: Send + Sync {
    type Item: ListEntity;
    type Input: Send + 'static;

    async fn list(&self, scope: &str) -> Result<Vec<Self::Item>>;

    /// Create from `input`; returns every item the server created
    async fn create(&self, scope: &str, input: Self::Input) -> Result<Vec<Self::Item>>;

    async fn delete(&self, scope: &str, id: &str) -> Result<()>;
}

/// Collections whose items can be edited in place
#[async_trait]
pub trait ScopedUpdate: ScopedCollection {
    type Patch: Send + 'static;

    /// Apply `patch` and return the server's canonical item
    async fn update(&self, scope: &str, id: &str, patch: Self::Patch) -> Result<Self::Item>;
}

//! Per-task collections of comments and files
//!
//! `ListCache` keeps the last fetched collection for each parent scope (a
//! task id) and applies creates, updates and deletes only after the server
//! confirms them. The local collection never contains a placeholder or a
//! client-side merge; it only ever holds objects the server returned.

use crate::api::{ListEntity, ScopedCollection, ScopedUpdate};
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Confirmed-only local mirror of scoped collections
pub struct ListCache<B: ScopedCollection> {
    backend: Arc<B>,
    scopes: RwLock<HashMap<String, Vec<B::Item>>>,
}

impl<B: ScopedCollection> ListCache<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            scopes: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Replace the scope's collection with the server's list.
    ///
    /// On failure the previous collection is left as it was.
    pub async fn load(&self, scope: &str) -> Result<Vec<B::Item>> {
        let items = self
            .backend
            .list(scope)
            .await
            .map_err(|e| reclassify(e, AppError::Fetch))?;
        let items = in_scope(scope, items);

        tracing::debug!("Loaded {} item(s) for scope {}", items.len(), scope);
        self.write().insert(scope.to_string(), items.clone());
        Ok(items)
    }

    /// Seed a scope from data fetched elsewhere (e.g. files embedded in a task)
    pub fn seed(&self, scope: &str, items: Vec<B::Item>) {
        let items = in_scope(scope, items);
        self.write().insert(scope.to_string(), items);
    }

    /// Create on the server, then append the confirmed item(s).
    ///
    /// Nothing is shown before the server answers. A returned item whose id
    /// is already present replaces the existing entry. Scopes that were
    /// never loaded stay unloaded; the created items are only returned.
    pub async fn insert(&self, scope: &str, input: B::Input) -> Result<Vec<B::Item>> {
        let created = self
            .backend
            .create(scope, input)
            .await
            .map_err(|e| reclassify(e, AppError::Mutation))?;
        let created = in_scope(scope, created);

        let mut scopes = self.write();
        let Some(items) = scopes.get_mut(scope) else {
            tracing::debug!("Scope {} not loaded, {} created item(s) not cached", scope, created.len());
            return Ok(created);
        };
        for item in &created {
            match items.iter_mut().find(|existing| existing.id() == item.id()) {
                Some(existing) => *existing = item.clone(),
                None => items.push(item.clone()),
            }
        }

        tracing::debug!("Inserted {} item(s) into scope {}", created.len(), scope);
        Ok(created)
    }

    /// Delete on the server, then remove locally.
    ///
    /// On failure the item stays and `AppError::Delete` is returned.
    pub async fn delete(&self, scope: &str, id: &str) -> Result<()> {
        self.backend
            .delete(scope, id)
            .await
            .map_err(|e| reclassify(e, AppError::Delete))?;

        if let Some(items) = self.write().get_mut(scope) {
            items.retain(|item| item.id() != id);
        }

        tracing::debug!("Deleted {} from scope {}", id, scope);
        Ok(())
    }

    /// Snapshot of a scope; empty if it was never loaded
    pub fn items(&self, scope: &str) -> Vec<B::Item> {
        self.read().get(scope).cloned().unwrap_or_default()
    }

    pub fn get(&self, scope: &str, id: &str) -> Option<B::Item> {
        self.read()
            .get(scope)
            .and_then(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    pub fn len(&self, scope: &str) -> usize {
        self.read().get(scope).map_or(0, Vec::len)
    }

    pub fn is_loaded(&self, scope: &str) -> bool {
        self.read().contains_key(scope)
    }

    /// Items of the scope authored or uploaded by `user_id`
    pub fn owned_by(&self, scope: &str, user_id: &str) -> Vec<B::Item> {
        self.read()
            .get(scope)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_owned_by(user_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget a scope, e.g. when leaving the task detail view
    pub fn evict(&self, scope: &str) {
        self.write().remove(scope);
    }

    /// Forget every scope, used on sign-out
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<B::Item>>> {
        self.scopes.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<B::Item>>> {
        self.scopes.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl<B: ScopedUpdate> ListCache<B> {
    /// Update on the server, then swap in the server's echo.
    ///
    /// The patch is never merged locally. If the item is not cached the
    /// collection is left unchanged.
    pub async fn update(&self, scope: &str, id: &str, patch: B::Patch) -> Result<B::Item> {
        let updated = self
            .backend
            .update(scope, id, patch)
            .await
            .map_err(|e| reclassify(e, AppError::Mutation))?;

        if updated.scope_id() != scope {
            tracing::warn!("Update of {} echoed scope {}, expected {}", id, updated.scope_id(), scope);
            return Ok(updated);
        }

        let mut scopes = self.write();
        let slot = scopes
            .get_mut(scope)
            .and_then(|items| items.iter_mut().find(|item| item.id() == id));
        match slot {
            Some(existing) => *existing = updated.clone(),
            None => tracing::debug!("Updated {} is not cached in scope {}", id, scope),
        }

        Ok(updated)
    }
}

/// Drop items the server attributed to another scope
fn in_scope<T: ListEntity>(scope: &str, items: Vec<T>) -> Vec<T> {
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| item.scope_id() == scope)
        .collect();
    if kept.len() != total {
        tracing::warn!("Ignored {} item(s) outside scope {}", total - kept.len(), scope);
    }
    kept
}

/// Keep auth and validation errors, fold everything else into `kind`
fn reclassify(err: AppError, kind: fn(String) -> AppError) -> AppError {
    match err {
        AppError::Auth(_) | AppError::Validation(_) => err,
        AppError::Fetch(msg) | AppError::Mutation(msg) | AppError::Delete(msg) => kind(msg),
        other => kind(other.to_string()),
    }
}

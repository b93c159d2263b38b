//! In-memory stores for tests.
//!
//! Data lives in `Arc<RwLock<_>>` maps and is lost when the store is dropped.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::attachments::{attachment_url, AttachmentStore};
use crate::error::TodoError;
use crate::todos_access::TodoStore;
use crate::types::{TodoItem, TodoUpdate};

#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoStore {
    items: Arc<RwLock<HashMap<(String, String), TodoItem>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `delete` fail with `StoreUnavailable`.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, user_id: &str, todo_id: &str) -> Option<TodoItem> {
        self.items
            .read()
            .await
            .get(&(user_id.to_string(), todo_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|todo| todo.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        user_id: &str,
        name: String,
        due_date: String,
        attachment_url: Option<String>,
    ) -> Result<TodoItem, TodoError> {
        let todo = TodoItem::new(user_id, name, due_date, attachment_url);
        self.items.write().await.insert(
            (todo.user_id.clone(), todo.todo_id.clone()),
            todo.clone(),
        );
        Ok(todo)
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
    ) -> Result<(), TodoError> {
        let mut items = self.items.write().await;
        let todo = items
            .get_mut(&(user_id.to_string(), todo_id.to_string()))
            .ok_or_else(|| TodoError::NotFound {
                todo_id: todo_id.to_string(),
            })?;
        todo.apply(update);
        Ok(())
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, TodoError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TodoError::StoreUnavailable("DeleteItem failed".to_string()));
        }
        Ok(self
            .items
            .write()
            .await
            .remove(&(user_id.to_string(), todo_id.to_string())))
    }

    async fn set_attachment_url(
        &self,
        user_id: &str,
        todo_id: &str,
        url: &str,
    ) -> Result<(), TodoError> {
        let mut items = self.items.write().await;
        let todo = items
            .get_mut(&(user_id.to_string(), todo_id.to_string()))
            .ok_or_else(|| TodoError::NotFound {
                todo_id: todo_id.to_string(),
            })?;
        todo.attachment_url = Some(url.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryAttachmentStore {
    bucket: String,
    objects: Arc<RwLock<HashSet<String>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryAttachmentStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashSet::new())),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate a client completing an upload.
    pub async fn put_object(&self, object_key: &str) {
        self.objects.write().await.insert(object_key.to_string());
    }

    pub async fn contains(&self, object_key: &str) -> bool {
        self.objects.read().await.contains(object_key)
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn upload_url(&self, object_key: &str) -> Result<String, TodoError> {
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}?X-Amz-Signature=local",
            self.bucket, object_key
        ))
    }

    async fn delete_object(&self, object_key: &str) -> Result<(), TodoError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TodoError::StoreUnavailable("DeleteObject failed".to_string()));
        }
        self.objects.write().await.remove(object_key);
        Ok(())
    }

    fn public_url(&self, object_key: &str) -> String {
        attachment_url(&self.bucket, object_key)
    }
}

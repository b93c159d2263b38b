use std::sync::Arc;

use crate::attachments::AttachmentStore;
use crate::error::TodoError;
use crate::todos_access::TodoStore;
use crate::types::{CreateTodoRequest, TodoItem, UpdateTodoRequest};

/// Business rules for the todo API, on top of the item and attachment stores.
#[derive(Clone)]
pub struct TodoService {
    items: Arc<dyn TodoStore>,
    attachments: Arc<dyn AttachmentStore>,
}

impl TodoService {
    pub fn new(items: Arc<dyn TodoStore>, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self { items, attachments }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        self.items.list_by_owner(user_id).await
    }

    /// New items never start with an attachment.
    pub async fn create(
        &self,
        user_id: &str,
        request: CreateTodoRequest,
    ) -> Result<TodoItem, TodoError> {
        request.validate()?;
        self.items
            .create(user_id, request.name, request.due_date, None)
            .await
    }

    pub async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        request: UpdateTodoRequest,
    ) -> Result<(), TodoError> {
        request.validate()?;
        self.items.update(user_id, todo_id, &request).await
    }

    /// Issue an upload URL keyed by `todo_id` and record the attachment URL on the item.
    ///
    /// The item is updated as soon as the URL is issued, whether or not the
    /// caller ever uploads anything.
    pub async fn request_attachment_upload(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<String, TodoError> {
        let upload_url = self.attachments.upload_url(todo_id).await?;
        let public_url = self.attachments.public_url(todo_id);
        self.items
            .set_attachment_url(user_id, todo_id, &public_url)
            .await?;

        Ok(upload_url)
    }

    /// Remove the item, then its attachment object.
    ///
    /// Attachment keys are not scoped by user, so the object is only removed
    /// once a record owned by `user_id` has actually been deleted. If the
    /// object delete then fails the record stays gone and the error is returned.
    pub async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), TodoError> {
        let Some(removed) = self.items.delete(user_id, todo_id).await? else {
            tracing::info!(user_id = %user_id, todo_id = %todo_id, "No todo to delete");
            return Ok(());
        };

        if let Err(e) = self.attachments.delete_object(&removed.todo_id).await {
            tracing::error!(
                user_id = %user_id,
                todo_id = %todo_id,
                "Todo deleted but its attachment was left behind: {}",
                e
            );
            return Err(e);
        }

        Ok(())
    }
}

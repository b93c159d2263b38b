use serde::{Deserialize, Serialize};

use crate::error::TodoError;

// ========== TODO ==========
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub user_id: String,
    pub todo_id: String,
    pub created_at: String,
    pub name: String,
    pub due_date: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl TodoItem {
    /// Build a fresh item with a generated id and the current timestamp.
    pub fn new(
        user_id: &str,
        name: String,
        due_date: String,
        attachment_url: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            todo_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            name,
            due_date,
            done: false,
            attachment_url,
        }
    }

    pub fn apply(&mut self, update: &TodoUpdate) {
        self.name = update.name.clone();
        self.due_date = update.due_date.clone();
        self.done = update.done;
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<(), TodoError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("dueDate", &self.due_date)
    }
}

/// The only fields a client may change on an existing item.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoUpdate {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

pub type UpdateTodoRequest = TodoUpdate;

impl TodoUpdate {
    pub fn validate(&self) -> Result<(), TodoError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("dueDate", &self.due_date)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub items: Vec<TodoItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
}

fn require_non_blank(field: &str, value: &str) -> Result<(), TodoError> {
    if value.trim().is_empty() {
        return Err(TodoError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_starts_open_without_attachment() {
        let item = TodoItem::new("u1", "Buy milk".into(), "2024-01-01".into(), None);

        assert_eq!(item.user_id, "u1");
        assert!(!item.done);
        assert!(item.attachment_url.is_none());
        assert!(uuid::Uuid::parse_str(&item.todo_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&item.created_at).is_ok());
    }

    #[test]
    fn item_serializes_camel_case_and_omits_missing_attachment() {
        let item = TodoItem::new("u1", "Buy milk".into(), "2024-01-01".into(), None);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["userId"], "u1");
        assert_eq!(json["dueDate"], "2024-01-01");
        assert!(json.get("todoId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("attachmentUrl").is_none());
    }

    #[test]
    fn update_request_parses_camel_case() {
        let req: UpdateTodoRequest =
            serde_json::from_str(r#"{"name":"Buy milk","dueDate":"2024-01-02","done":true}"#)
                .unwrap();

        assert_eq!(req.due_date, "2024-01-02");
        assert!(req.done);
    }

    #[test]
    fn blank_name_is_rejected() {
        let req = CreateTodoRequest {
            name: "   ".into(),
            due_date: "2024-01-01".into(),
        };

        assert!(matches!(req.validate(), Err(TodoError::InvalidRequest(_))));
    }

    #[test]
    fn upload_url_response_uses_camel_case() {
        let body = serde_json::to_string(&UploadUrlResponse {
            upload_url: "https://example".into(),
        })
        .unwrap();

        assert_eq!(body, r#"{"uploadUrl":"https://example"}"#);
    }
}

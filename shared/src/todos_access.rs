use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use crate::error::TodoError;
use crate::types::{TodoItem, TodoUpdate};

/// Persistence for todo records, keyed by `(userId, todoId)`.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All items owned by `user_id`, in whatever order the store returns them.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError>;

    /// Write a new item with a generated id, `done = false` and the current time.
    async fn create(
        &self,
        user_id: &str,
        name: String,
        due_date: String,
        attachment_url: Option<String>,
    ) -> Result<TodoItem, TodoError>;

    /// Overwrite `name`, `dueDate` and `done`. Fails with `NotFound` if the item is absent.
    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
    ) -> Result<(), TodoError>;

    /// Idempotent. Returns the removed item, or `None` if `user_id` owned no such item.
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, TodoError>;

    async fn set_attachment_url(
        &self,
        user_id: &str,
        todo_id: &str,
        url: &str,
    ) -> Result<(), TodoError>;
}

pub struct DynamoTodoStore {
    client: DynamoClient,
    table_name: String,
    user_index: String,
}

impl DynamoTodoStore {
    pub fn new(
        client: DynamoClient,
        table_name: impl Into<String>,
        user_index: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            user_index: user_index.into(),
        }
    }

    fn key(user_id: &str, todo_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("userId".to_string(), AttributeValue::S(user_id.to_string())),
            ("todoId".to_string(), AttributeValue::S(todo_id.to_string())),
        ])
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        tracing::info!(user_id = %user_id, "Getting all todos");

        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.user_index)
                .key_condition_expression("userId = :userId")
                .expression_attribute_values(":userId", AttributeValue::S(user_id.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| unavailable("Query", e))?;

            for item in result.items.unwrap_or_default() {
                todos.push(item_to_todo(&item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(todos)
    }

    async fn create(
        &self,
        user_id: &str,
        name: String,
        due_date: String,
        attachment_url: Option<String>,
    ) -> Result<TodoItem, TodoError> {
        let todo = TodoItem::new(user_id, name, due_date, attachment_url);
        tracing::info!(user_id = %user_id, todo_id = %todo.todo_id, "Storing new item");

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(todo_to_item(&todo)))
            .send()
            .await
            .map_err(|e| unavailable("PutItem", e))?;

        Ok(todo)
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
    ) -> Result<(), TodoError> {
        tracing::info!(user_id = %user_id, todo_id = %todo_id, "Updating todo");

        // "name" is a reserved word in DynamoDB expressions.
        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .update_expression("SET #name = :name, dueDate = :dueDate, done = :done")
            .condition_expression("attribute_exists(todoId)")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":name", AttributeValue::S(update.name.clone()))
            .expression_attribute_values(":dueDate", AttributeValue::S(update.due_date.clone()))
            .expression_attribute_values(":done", AttributeValue::Bool(update.done))
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                UpdateItemError::ConditionalCheckFailedException(_) => TodoError::NotFound {
                    todo_id: todo_id.to_string(),
                },
                other => unavailable("UpdateItem", other),
            })?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, TodoError> {
        tracing::info!(user_id = %user_id, todo_id = %todo_id, "Deleting todo");

        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| unavailable("DeleteItem", e))?;

        match result.attributes {
            Some(item) if !item.is_empty() => Ok(Some(item_to_todo(&item)?)),
            _ => Ok(None),
        }
    }

    async fn set_attachment_url(
        &self,
        user_id: &str,
        todo_id: &str,
        url: &str,
    ) -> Result<(), TodoError> {
        tracing::info!(user_id = %user_id, todo_id = %todo_id, "Updating attachment url");

        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .update_expression("SET attachmentUrl = :attachmentUrl")
            .condition_expression("attribute_exists(todoId)")
            .expression_attribute_values(":attachmentUrl", AttributeValue::S(url.to_string()))
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                UpdateItemError::ConditionalCheckFailedException(_) => TodoError::NotFound {
                    todo_id: todo_id.to_string(),
                },
                other => unavailable("UpdateItem", other),
            })?;

        Ok(())
    }
}

fn unavailable<E: std::error::Error>(operation: &str, err: E) -> TodoError {
    let message = format!("{} failed: {}", operation, DisplayErrorContext(err));
    tracing::error!("{}", message);
    TodoError::StoreUnavailable(message)
}

/// Convert a todo into a DynamoDB item.
pub fn todo_to_item(todo: &TodoItem) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        ("userId".to_string(), AttributeValue::S(todo.user_id.clone())),
        ("todoId".to_string(), AttributeValue::S(todo.todo_id.clone())),
        ("createdAt".to_string(), AttributeValue::S(todo.created_at.clone())),
        ("name".to_string(), AttributeValue::S(todo.name.clone())),
        ("dueDate".to_string(), AttributeValue::S(todo.due_date.clone())),
        ("done".to_string(), AttributeValue::Bool(todo.done)),
    ]);

    if let Some(url) = &todo.attachment_url {
        item.insert("attachmentUrl".to_string(), AttributeValue::S(url.clone()));
    }

    item
}

/// Convert a DynamoDB item into a todo. Key attributes are required.
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<TodoItem, TodoError> {
    let string = |name: &str| item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string());
    let required = |name: &str| {
        string(name).ok_or_else(|| TodoError::MalformedItem(format!("missing attribute {}", name)))
    };

    Ok(TodoItem {
        user_id: required("userId")?,
        todo_id: required("todoId")?,
        created_at: string("createdAt").unwrap_or_default(),
        name: string("name").unwrap_or_default(),
        due_date: string("dueDate").unwrap_or_default(),
        done: item.get("done").and_then(|v| v.as_bool().ok()).copied().unwrap_or(false),
        attachment_url: string("attachmentUrl"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TodoItem {
        TodoItem {
            user_id: "u1".into(),
            todo_id: "t1".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
            name: "Buy milk".into(),
            due_date: "2024-01-01".into(),
            done: false,
            attachment_url: None,
        }
    }

    #[test]
    fn item_uses_table_attribute_names() {
        let item = todo_to_item(&sample());

        assert_eq!(item.get("userId"), Some(&AttributeValue::S("u1".into())));
        assert_eq!(item.get("todoId"), Some(&AttributeValue::S("t1".into())));
        assert_eq!(item.get("dueDate"), Some(&AttributeValue::S("2024-01-01".into())));
        assert_eq!(item.get("done"), Some(&AttributeValue::Bool(false)));
        assert!(!item.contains_key("attachmentUrl"));
    }

    #[test]
    fn attachment_url_survives_conversion() {
        let mut todo = sample();
        todo.attachment_url = Some("https://files.s3.amazonaws.com/t1".into());

        let back = item_to_todo(&todo_to_item(&todo)).unwrap();

        assert_eq!(back, todo);
    }

    #[test]
    fn missing_key_attribute_is_malformed() {
        let mut item = todo_to_item(&sample());
        item.remove("todoId");

        assert!(matches!(item_to_todo(&item), Err(TodoError::MalformedItem(_))));
    }

    #[test]
    fn missing_done_defaults_to_false() {
        let mut item = todo_to_item(&sample());
        item.remove("done");

        assert!(!item_to_todo(&item).unwrap().done);
    }

    mod dynamo {
        use super::super::*;
        use aws_sdk_dynamodb::config::retry::RetryConfig;
        use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
        use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
        use aws_smithy_runtime_api::http::{Request, Response, StatusCode};
        use aws_smithy_types::body::SdkBody;

        const TODO_T1: &str = r#"{"userId":{"S":"u1"},"todoId":{"S":"t1"},"createdAt":{"S":"2024-01-01T00:00:00+00:00"},"name":{"S":"Buy milk"},"dueDate":{"S":"2024-01-01"},"done":{"BOOL":false}}"#;
        const TODO_T2: &str = r#"{"userId":{"S":"u1"},"todoId":{"S":"t2"},"createdAt":{"S":"2024-01-02T00:00:00+00:00"},"name":{"S":"Buy bread"},"dueDate":{"S":"2024-01-03"},"done":{"BOOL":true}}"#;
        const CONDITION_FAILED: &str = r#"{"__type":"com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException","message":"The conditional request failed"}"#;

        fn reply(status: u16, body: String) -> ReplayEvent {
            let mut response = Response::new(
                StatusCode::try_from(status).unwrap(),
                SdkBody::from(body),
            );
            response
                .headers_mut()
                .insert("content-type", "application/x-amz-json-1.0");
            ReplayEvent::new(Request::new(SdkBody::empty()), response)
        }

        fn store(events: Vec<ReplayEvent>) -> DynamoTodoStore {
            let config = aws_sdk_dynamodb::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
                .retry_config(RetryConfig::disabled())
                .http_client(StaticReplayClient::new(events))
                .build();
            DynamoTodoStore::new(DynamoClient::from_conf(config), "todos", "TodosByUserIndex")
        }

        fn update() -> TodoUpdate {
            TodoUpdate {
                name: "Buy milk".into(),
                due_date: "2024-01-02".into(),
                done: true,
            }
        }

        #[tokio::test]
        async fn list_follows_last_evaluated_key() {
            let store = store(vec![
                reply(
                    200,
                    format!(
                        r#"{{"Items":[{}],"Count":1,"LastEvaluatedKey":{{"userId":{{"S":"u1"}},"todoId":{{"S":"t1"}}}}}}"#,
                        TODO_T1
                    ),
                ),
                reply(200, format!(r#"{{"Items":[{}],"Count":1}}"#, TODO_T2)),
            ]);

            let todos = store.list_by_owner("u1").await.unwrap();

            let ids: Vec<&str> = todos.iter().map(|t| t.todo_id.as_str()).collect();
            assert_eq!(ids, vec!["t1", "t2"]);
            assert!(todos[1].done);
        }

        #[tokio::test]
        async fn failed_condition_on_update_is_not_found() {
            let store = store(vec![reply(400, CONDITION_FAILED.to_string())]);

            let err = store.update("u1", "missing", &update()).await.unwrap_err();

            assert!(matches!(err, TodoError::NotFound { todo_id } if todo_id == "missing"));
        }

        #[tokio::test]
        async fn failed_condition_on_attachment_url_is_not_found() {
            let store = store(vec![reply(400, CONDITION_FAILED.to_string())]);

            let err = store
                .set_attachment_url("u1", "missing", "https://files.s3.amazonaws.com/missing")
                .await
                .unwrap_err();

            assert!(matches!(err, TodoError::NotFound { .. }));
        }

        #[tokio::test]
        async fn server_error_is_store_unavailable() {
            let store = store(vec![reply(
                500,
                r#"{"__type":"com.amazonaws.dynamodb.v20120810#InternalServerError","message":"boom"}"#
                    .to_string(),
            )]);

            let err = store.update("u1", "t1", &update()).await.unwrap_err();

            assert!(matches!(err, TodoError::StoreUnavailable(_)));
        }

        #[tokio::test]
        async fn delete_returns_the_removed_item() {
            let store = store(vec![reply(200, format!(r#"{{"Attributes":{}}}"#, TODO_T1))]);

            let removed = store.delete("u1", "t1").await.unwrap().unwrap();

            assert_eq!(removed.todo_id, "t1");
            assert_eq!(removed.user_id, "u1");
        }

        #[tokio::test]
        async fn delete_of_unowned_item_returns_none() {
            let store = store(vec![reply(200, "{}".to_string())]);

            assert!(store.delete("u2", "t1").await.unwrap().is_none());
        }
    }
}

use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use std::sync::Arc;
use todo_shared::error::TodoError;
use todo_shared::types::{CreateTodoRequest, TodoListResponse, UpdateTodoRequest, UploadUrlResponse};
use todo_shared::AppState;

use crate::identity;

enum Reply {
    Json(StatusCode, serde_json::Value),
    Empty(StatusCode),
}

/// Main Lambda handler - routes requests to the todo service
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("Todo API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Credentials", "true")
            .header("Access-Control-Allow-Methods", "GET,POST,PATCH,DELETE,OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type,Authorization")
            .body(Body::Empty)
            .map_err(Box::new)?);
    }

    let Some(user_id) = identity::caller_id(&event, state.config.is_offline) else {
        tracing::warn!("Rejecting request without caller identity");
        return error_response(&TodoError::Unauthorized);
    };

    let todos = &state.todos;
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let result = match (method, parts.as_slice()) {
        // GET /todos - list the caller's todos
        (&Method::GET, ["todos"]) => todos
            .list(&user_id)
            .await
            .map(|items| Reply::Json(StatusCode::OK, serde_json::json!(TodoListResponse { items }))),
        // POST /todos - create todo
        (&Method::POST, ["todos"]) => match serde_json::from_slice::<CreateTodoRequest>(body) {
            Ok(req) => todos
                .create(&user_id, req)
                .await
                .map(|todo| Reply::Json(StatusCode::CREATED, serde_json::json!(todo))),
            Err(e) => Err(e.into()),
        },
        // PATCH /todos/{id} - update name, dueDate and done
        (&Method::PATCH, ["todos", todo_id]) => {
            match serde_json::from_slice::<UpdateTodoRequest>(body) {
                Ok(req) => todos
                    .update(&user_id, todo_id, req)
                    .await
                    .map(|_| Reply::Empty(StatusCode::OK)),
                Err(e) => Err(e.into()),
            }
        }
        // DELETE /todos/{id} - delete todo and its attachment
        (&Method::DELETE, ["todos", todo_id]) => todos
            .delete(&user_id, todo_id)
            .await
            .map(|_| Reply::Empty(StatusCode::OK)),
        // POST /todos/{id}/attachment - presigned upload URL
        (&Method::POST, ["todos", todo_id, "attachment"]) => todos
            .request_attachment_upload(&user_id, todo_id)
            .await
            .map(|upload_url| {
                Reply::Json(StatusCode::OK, serde_json::json!(UploadUrlResponse { upload_url }))
            }),
        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            return not_found();
        }
    };

    match result {
        Ok(Reply::Json(status, value)) => json_response(status, &value),
        Ok(Reply::Empty(status)) => Ok(Response::builder()
            .status(status)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Credentials", "true")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(user_id = %user_id, "Request failed: {}", e);
            error_response(&e)
        }
    }
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Credentials", "true")
        .body(value.to_string().into())
        .map_err(Box::new)?)
}

fn error_response(error: &TodoError) -> Result<Response<Body>, Error> {
    let status = StatusCode::from_u16(error.status_code())?;
    json_response(status, &serde_json::json!(error.to_response()))
}

fn not_found() -> Result<Response<Body>, Error> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({"error": "NotFound", "message": "Not found"}),
    )
}

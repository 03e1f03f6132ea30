use axum::{extract::{Path, State}, routing::get, Router, Json};
use axum::http::StatusCode;

use crate::{application::todo_service::TodoService, domain::todo::{NewTodo, TodoId, TodoItem}, http::types::ApiError};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(add_todo::<S>))
        .route("/todos/:id", get(get_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<serde_json::Value>, ApiError> {
    let todos = state.service.list_all().await?;
    Ok(Json(serde_json::json!({ "items": todos })))
}

async fn add_todo<S: TodoService>(State(state): State<AppState<S>>, Json(payload): Json<NewTodo>) -> Result<Json<TodoItem>, ApiError> {
    Ok(Json(state.service.add(payload).await?))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<TodoItem>, ApiError> {
    let id = parse_id(&id)?;
    state.service.get_by_id(id).await?.map(Json).ok_or_else(ApiError::not_found)
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { uuid::Uuid::parse_str(s).map(TodoId).map_err(|_| ApiError::bad_request("invalid id")) }

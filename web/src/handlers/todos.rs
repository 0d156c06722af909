//! Todo CRUD endpoints.
//!
//! ```text
//! GET    /todos      -> 200 [Todo]
//! POST   /todos      -> 201 Todo      body: {"title": string}
//! GET    /todos/:id  -> 200 Todo
//! PUT    /todos/:id  -> 200 Todo      body: {"title": string, "completed": bool}
//! DELETE /todos/:id  -> 204
//! ```

use super::run_service;
use crate::WebResult;
use crate::extractors::JsonBody;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use todokv_core::Todo;

/// Body of `POST /todos`.
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    /// Title of the new todo
    pub title: String,
}

/// Body of `PUT /todos/:id`; both fields are required.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    /// Replacement title
    pub title: String,
    /// Replacement completion flag
    pub completed: bool,
}

/// List every todo in identifier order.
pub async fn list_todos(State(state): State<AppState>) -> WebResult<Json<Vec<Todo>>> {
    let todos = run_service(&state, state.request_timeout(), |service, ctx| {
        service.list(ctx)
    })
    .await?;
    Ok(Json(todos))
}

/// Create a todo with a generated id.
pub async fn create_todo(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTodoRequest>,
) -> WebResult<(StatusCode, Json<Todo>)> {
    let todo = run_service(&state, state.request_timeout(), move |service, ctx| {
        service.create(ctx, &body.title)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Fetch one todo.
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<Todo>> {
    let todo = run_service(&state, state.request_timeout(), move |service, ctx| {
        service.get(ctx, &id)
    })
    .await?;
    Ok(Json(todo))
}

/// Replace title and completion flag of an existing todo.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateTodoRequest>,
) -> WebResult<Json<Todo>> {
    let todo = run_service(&state, state.request_timeout(), move |service, ctx| {
        service.update(ctx, &id, &body.title, body.completed)
    })
    .await?;
    Ok(Json(todo))
}

/// Delete a todo.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    run_service(&state, state.request_timeout(), move |service, ctx| {
        service.delete(ctx, &id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

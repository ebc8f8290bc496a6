//! Task handlers.

use super::{list_role, non_empty, required, task_role};
use crate::auth::{AppState, RequireAuth};
use crate::db::{NewTask, SortOrder, TaskFilter, TaskRepository, TaskSort, TaskStatus, TodoTask, limit_offset};
use crate::error::{ApiError, ApiResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use listkeeper_authz::Capability;
use listkeeper_core::{ListId, TaskId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Query parameters for `GET /api/lists/{id}/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub due_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
    pub sort: Option<TaskSort>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl TaskQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        let status = non_empty(self.status)
            .map(|s| s.parse::<TaskStatus>())
            .transpose()
            .map_err(ApiError::bad_request)?;
        let (limit, offset) = limit_offset(self.page, self.page_size);
        Ok(TaskFilter {
            status,
            tag: non_empty(self.tag),
            search: non_empty(self.search),
            due_before: self.due_before,
            due_after: self.due_after,
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
            limit,
            offset,
        })
    }
}

/// Lists a list's tasks with filters, sorting, and paging.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<TodoTask>>> {
    list_role(&state, &session, list_id, Capability::Read).await?;
    let filter = query.into_filter()?;
    let tasks = TaskRepository::new(state.db_pool.clone())
        .list(list_id, &filter)
        .await?;
    Ok(Json(tasks))
}

/// Creates a task in a list.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
    Json(body): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<TodoTask>)> {
    list_role(&state, &session, list_id, Capability::Write).await?;
    required("title", &body.title)?;
    let task = TaskRepository::new(state.db_pool.clone())
        .create(list_id, session.user_id(), &body)
        .await?;
    info!(task_id = %task.id, %list_id, user_id = %session.user_id(), "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Returns a task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<TodoTask>> {
    task_role(&state, &session, task_id, Capability::Read).await?;
    let task = TaskRepository::new(state.db_pool.clone())
        .find_by_id(task_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

/// Replaces a task's editable fields.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
    Json(body): Json<NewTask>,
) -> ApiResult<Json<TodoTask>> {
    task_role(&state, &session, task_id, Capability::Write).await?;
    required("title", &body.title)?;
    let task = TaskRepository::new(state.db_pool.clone())
        .update(task_id, &body)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    task_role(&state, &session, task_id, Capability::Write).await?;
    if !TaskRepository::new(state.db_pool.clone())
        .delete(task_id)
        .await?
    {
        return Err(ApiError::NotFound);
    }
    info!(%task_id, user_id = %session.user_id(), "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

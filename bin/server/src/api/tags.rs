//! Tag handlers.

use super::{required, task_role};
use crate::auth::{AppState, RequireAuth};
use crate::db::{Tag, TagRepository};
use crate::error::{ApiError, ApiResult};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use listkeeper_authz::Capability;
use listkeeper_core::{TagId, TaskId};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub label: String,
}

/// Lists a task's tags.
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<Vec<Tag>>> {
    task_role(&state, &session, task_id, Capability::Read).await?;
    let tags = TagRepository::new(state.db_pool.clone())
        .for_task(task_id)
        .await?;
    Ok(Json(tags))
}

/// Tags a task with a new label.
pub async fn add_tag(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
    Json(body): Json<TagBody>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    task_role(&state, &session, task_id, Capability::Write).await?;
    required("label", &body.label)?;
    let tag = TagRepository::new(state.db_pool.clone())
        .attach_new(task_id, body.label.trim(), session.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Removes a tag from a task.
pub async fn remove_tag(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path((task_id, tag_id)): Path<(TaskId, TagId)>,
) -> ApiResult<StatusCode> {
    task_role(&state, &session, task_id, Capability::Write).await?;
    if !TagRepository::new(state.db_pool.clone())
        .detach(task_id, tag_id)
        .await?
    {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

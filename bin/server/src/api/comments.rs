//! Comment handlers.

use super::{required, task_role};
use crate::auth::{AppState, RequireAuth};
use crate::db::{Comment, CommentRepository};
use crate::error::{ApiError, ApiResult};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use listkeeper_authz::Capability;
use listkeeper_core::{CommentId, TaskId};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub text: String,
}

/// Lists a task's comments.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<Vec<Comment>>> {
    task_role(&state, &session, task_id, Capability::Read).await?;
    let comments = CommentRepository::new(state.db_pool.clone())
        .for_task(task_id)
        .await?;
    Ok(Json(comments))
}

/// Adds a comment to a task.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(task_id): Path<TaskId>,
    Json(body): Json<CommentBody>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    task_role(&state, &session, task_id, Capability::Write).await?;
    required("text", &body.text)?;
    let comment = CommentRepository::new(state.db_pool.clone())
        .create(task_id, session.user_id(), body.text.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Deletes a comment. Needs write access to the comment's task.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(comment_id): Path<CommentId>,
) -> ApiResult<StatusCode> {
    let comments = CommentRepository::new(state.db_pool.clone());
    let comment = comments
        .find_by_id(comment_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    task_role(&state, &session, comment.task_id, Capability::Write).await?;
    if !comments.delete(comment_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

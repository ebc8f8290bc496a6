//! List and role assignment handlers.

use super::{list_role, non_empty, required};
use crate::auth::{AppState, RequireAuth};
use crate::db::{ListRepository, RoleAssignment, TodoList, UserRepository, VisibleList, limit_offset};
use crate::error::{ApiError, ApiResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use listkeeper_authz::{Capability, ListRole};
use listkeeper_core::{ListId, UserId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Query parameters for `GET /api/lists`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Body for creating or updating a list.
#[derive(Debug, Deserialize)]
pub struct ListBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /api/lists/{id}/roles/{user_id}`.
#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: String,
}

/// Lists the caller's own and shared lists.
pub async fn list_lists(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<VisibleList>>> {
    let (limit, offset) = limit_offset(query.page, query.page_size);
    let search = non_empty(query.search);
    let lists = ListRepository::new(state.db_pool.clone())
        .list_visible(session.user_id(), search.as_deref(), limit, offset)
        .await?;
    Ok(Json(lists))
}

/// Creates a list owned by the caller.
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Json(body): Json<ListBody>,
) -> ApiResult<(StatusCode, Json<TodoList>)> {
    required("title", &body.title)?;
    let list = ListRepository::new(state.db_pool.clone())
        .create(
            session.user_id(),
            body.title.trim(),
            body.description.as_deref(),
        )
        .await?;
    info!(list_id = %list.id, user_id = %session.user_id(), "list created");
    Ok((StatusCode::CREATED, Json(list)))
}

/// Returns a list with the caller's role on it.
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
) -> ApiResult<Json<VisibleList>> {
    let role = list_role(&state, &session, list_id, Capability::Read).await?;
    let list = ListRepository::new(state.db_pool.clone())
        .find_by_id(list_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(VisibleList { list, role }))
}

/// Updates a list's title and description.
pub async fn update_list(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
    Json(body): Json<ListBody>,
) -> ApiResult<Json<TodoList>> {
    list_role(&state, &session, list_id, Capability::Write).await?;
    required("title", &body.title)?;
    let list = ListRepository::new(state.db_pool.clone())
        .update(list_id, body.title.trim(), body.description.as_deref())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(list))
}

/// Deletes a list and everything in it. Owner only.
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
) -> ApiResult<StatusCode> {
    list_role(&state, &session, list_id, Capability::Delete).await?;
    if !ListRepository::new(state.db_pool.clone())
        .delete(list_id)
        .await?
    {
        return Err(ApiError::NotFound);
    }
    info!(%list_id, user_id = %session.user_id(), "list deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the explicit role assignments on a list.
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path(list_id): Path<ListId>,
) -> ApiResult<Json<Vec<RoleAssignment>>> {
    list_role(&state, &session, list_id, Capability::Read).await?;
    let roles = ListRepository::new(state.db_pool.clone())
        .roles(list_id)
        .await?;
    Ok(Json(roles))
}

/// Parses an assignable role name; Owner and unknown names are rejected.
fn assignable_role(name: &str) -> ApiResult<ListRole> {
    ListRole::from_name(name).ok_or_else(|| {
        ApiError::bad_request(format!(
            "'{}' is not an assignable role; use Editor or Viewer",
            name.trim()
        ))
    })
}

/// Grants or changes a user's role on a list. Owner only.
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path((list_id, user_id)): Path<(ListId, UserId)>,
    Json(body): Json<RoleBody>,
) -> ApiResult<Json<RoleAssignment>> {
    list_role(&state, &session, list_id, Capability::ManageRoles).await?;
    let role = assignable_role(&body.role)?;

    let lists = ListRepository::new(state.db_pool.clone());
    let list = lists.find_by_id(list_id).await?.ok_or(ApiError::NotFound)?;
    if list.owner_id == user_id {
        return Err(ApiError::bad_request("the list owner cannot be given a role"));
    }
    UserRepository::new(state.db_pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let assignment = lists.assign_role(list_id, user_id, role).await?;
    info!(%list_id, %user_id, role = %assignment.role, "role assigned");
    Ok(Json(assignment))
}

/// Removes a user's role on a list. Owner only.
pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    RequireAuth(session): RequireAuth,
    Path((list_id, user_id)): Path<(ListId, UserId)>,
) -> ApiResult<StatusCode> {
    list_role(&state, &session, list_id, Capability::ManageRoles).await?;
    if !ListRepository::new(state.db_pool.clone())
        .revoke_role(list_id, user_id)
        .await?
    {
        return Err(ApiError::NotFound);
    }
    info!(%list_id, %user_id, "role revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_and_viewer_are_assignable() {
        assert_eq!(assignable_role("editor").ok(), Some(ListRole::Editor));
        assert_eq!(assignable_role(" Viewer ").ok(), Some(ListRole::Viewer));
    }

    #[test]
    fn owner_and_unknown_roles_are_bad_requests() {
        assert!(matches!(
            assignable_role("Owner"),
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(
            assignable_role("admin"),
            Err(ApiError::BadRequest { .. })
        ));
    }

    #[test]
    fn list_query_defaults_are_empty() {
        let query: ListQuery = serde_json::from_str("{}").expect("query");
        assert!(query.search.is_none());
        assert!(query.page.is_none());
    }
}

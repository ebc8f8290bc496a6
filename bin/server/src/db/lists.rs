//! Database repositories for lists and role assignments.
//!
//! The list's owner is recorded on the list itself and is never stored as a
//! role assignment row. [`ListRepository`] is also the server's
//! [`RoleSource`], so authorization reads the same tables the API writes.

use super::{contains_pattern, decode_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listkeeper_authz::{AuthzError, ListRole, Role, RoleSource};
use listkeeper_core::{ListId, RoleAssignmentId, TaskId, UserId};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

/// A to-do list record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    /// List ID.
    pub id: ListId,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// The owning user.
    pub owner_id: UserId,
    /// When the list was created.
    pub created_at: DateTime<Utc>,
}

/// A list as seen by a particular user, with their role on it.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleList {
    /// The list.
    #[serde(flatten)]
    pub list: TodoList,
    /// The caller's effective role.
    pub role: Role,
}

/// An explicit Editor/Viewer assignment on a list.
#[derive(Debug, Clone, Serialize)]
pub struct RoleAssignment {
    /// Assignment row ID.
    pub id: RoleAssignmentId,
    /// The list.
    pub list_id: ListId,
    /// The assignee.
    pub user_id: UserId,
    /// The assignee's username.
    pub username: String,
    /// The assigned role.
    pub role: Role,
}

/// Row type for list queries.
#[derive(FromRow)]
struct ListRow {
    id: i64,
    title: String,
    description: Option<String>,
    owner_id: i64,
    created_at: DateTime<Utc>,
}

impl From<ListRow> for TodoList {
    fn from(row: ListRow) -> Self {
        Self {
            id: ListId::new(row.id),
            title: row.title,
            description: row.description,
            owner_id: UserId::new(row.owner_id),
            created_at: row.created_at,
        }
    }
}

/// Row type for the visible-lists query.
#[derive(FromRow)]
struct VisibleListRow {
    #[sqlx(flatten)]
    list: ListRow,
    role: String,
}

/// Row type for role assignment queries.
#[derive(FromRow)]
struct AssignmentRow {
    id: i64,
    list_id: i64,
    user_id: i64,
    username: String,
    role_id: i16,
}

impl AssignmentRow {
    fn try_into_assignment(self) -> Result<RoleAssignment, sqlx::Error> {
        let role = ListRole::from_id(self.role_id)
            .ok_or_else(|| decode_error(format!("unknown role id {}", self.role_id)))?;
        Ok(RoleAssignment {
            id: RoleAssignmentId::new(self.id),
            list_id: ListId::new(self.list_id),
            user_id: UserId::new(self.user_id),
            username: self.username,
            role: role.into(),
        })
    }
}

/// Repository for list and role assignment operations.
#[derive(Clone)]
pub struct ListRepository {
    pool: PgPool,
}

impl ListRepository {
    /// Creates a new list repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a list owned by `owner_id`.
    pub async fn create(
        &self,
        owner_id: UserId,
        title: &str,
        description: Option<&str>,
    ) -> Result<TodoList, sqlx::Error> {
        let row: ListRow = sqlx::query_as(
            r#"
            INSERT INTO todo_lists (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, owner_id, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(owner_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Finds a list by ID.
    pub async fn find_by_id(&self, id: ListId) -> Result<Option<TodoList>, sqlx::Error> {
        let row: Option<ListRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, owner_id, created_at
            FROM todo_lists
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TodoList::from))
    }

    /// Updates a list's title and description.
    pub async fn update(
        &self,
        id: ListId,
        title: &str,
        description: Option<&str>,
    ) -> Result<Option<TodoList>, sqlx::Error> {
        let row: Option<ListRow> = sqlx::query_as(
            r#"
            UPDATE todo_lists
            SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, title, description, owner_id, created_at
            "#,
        )
        .bind(id.get())
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TodoList::from))
    }

    /// Deletes a list, cascading to its tasks and role assignments.
    pub async fn delete(&self, id: ListId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists the lists a user owns or has been given a role on, newest first.
    #[instrument(skip(self))]
    pub async fn list_visible(
        &self,
        user_id: UserId,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VisibleList>, sqlx::Error> {
        let rows: Vec<VisibleListRow> = sqlx::query_as(
            r#"
            SELECT l.id, l.title, l.description, l.owner_id, l.created_at,
                   CASE
                       WHEN l.owner_id = $1 THEN 'Owner'
                       WHEN r.role_id = 2 THEN 'Editor'
                       ELSE 'Viewer'
                   END AS role
            FROM todo_lists l
            LEFT JOIN todo_list_user_roles r ON r.list_id = l.id AND r.user_id = $1
            WHERE (l.owner_id = $1 OR r.user_id IS NOT NULL)
              AND ($2::TEXT IS NULL OR l.title ILIKE $2 OR l.description ILIKE $2)
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id.get())
        .bind(search.map(contains_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VisibleList {
                role: Role::from_name(&row.role),
                list: row.list.into(),
            })
            .collect())
    }

    /// Lists the explicit role assignments on a list.
    pub async fn roles(&self, list_id: ListId) -> Result<Vec<RoleAssignment>, sqlx::Error> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.list_id, r.user_id, u.username, r.role_id
            FROM todo_list_user_roles r
            JOIN users u ON u.id = r.user_id
            WHERE r.list_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(list_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(AssignmentRow::try_into_assignment)
            .collect()
    }

    /// Assigns (or reassigns) a role to a user on a list.
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        list_id: ListId,
        user_id: UserId,
        role: ListRole,
    ) -> Result<RoleAssignment, sqlx::Error> {
        let row: AssignmentRow = sqlx::query_as(
            r#"
            WITH upserted AS (
                INSERT INTO todo_list_user_roles (list_id, user_id, role_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (list_id, user_id) DO UPDATE SET role_id = EXCLUDED.role_id
                RETURNING id, list_id, user_id, role_id
            )
            SELECT up.id, up.list_id, up.user_id, u.username, up.role_id
            FROM upserted up
            JOIN users u ON u.id = up.user_id
            "#,
        )
        .bind(list_id.get())
        .bind(user_id.get())
        .bind(role.id())
        .fetch_one(&self.pool)
        .await?;

        row.try_into_assignment()
    }

    /// Removes a user's role on a list. Returns true if a row was deleted.
    #[instrument(skip(self))]
    pub async fn revoke_role(&self, list_id: ListId, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM todo_list_user_roles WHERE list_id = $1 AND user_id = $2")
                .bind(list_id.get())
                .bind(user_id.get())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn lookup_failed(e: sqlx::Error) -> Report<AuthzError> {
    AuthzError::LookupFailed {
        details: e.to_string(),
    }
    .into()
}

#[async_trait]
impl RoleSource for ListRepository {
    async fn list_owner(&self, list_id: ListId) -> Result<Option<UserId>, Report<AuthzError>> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT owner_id FROM todo_lists WHERE id = $1")
            .bind(list_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(lookup_failed)?;
        Ok(owner.map(UserId::new))
    }

    async fn assigned_role(
        &self,
        list_id: ListId,
        user_id: UserId,
    ) -> Result<Option<ListRole>, Report<AuthzError>> {
        let role_id: Option<i16> = sqlx::query_scalar(
            "SELECT role_id FROM todo_list_user_roles WHERE list_id = $1 AND user_id = $2",
        )
        .bind(list_id.get())
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(lookup_failed)?;
        Ok(role_id.and_then(ListRole::from_id))
    }

    async fn task_list(&self, task_id: TaskId) -> Result<Option<ListId>, Report<AuthzError>> {
        let list_id: Option<i64> = sqlx::query_scalar("SELECT list_id FROM todo_tasks WHERE id = $1")
            .bind(task_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(lookup_failed)?;
        Ok(list_id.map(ListId::new))
    }
}

//! Database repository for tasks, with filtering, sorting, search, and paging.

use super::{contains_pattern, decode_error};
use chrono::{DateTime, Utc};
use listkeeper_core::{ListId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Progress of a task. Persisted by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Returns the persisted status id.
    #[must_use]
    pub fn id(&self) -> i16 {
        match self {
            Self::NotStarted => 1,
            Self::InProgress => 2,
            Self::Completed => 3,
        }
    }

    /// Maps a persisted status id back to a status.
    #[must_use]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::NotStarted),
            2 => Some(Self::InProgress),
            3 => Some(Self::Completed),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    /// Accepts the canonical name in any case, with or without separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "notstarted" | "1" => Ok(Self::NotStarted),
            "inprogress" | "2" => Ok(Self::InProgress),
            "completed" | "3" => Ok(Self::Completed),
            _ => Err(format!("unknown task status '{s}'")),
        }
    }
}

/// A task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTask {
    /// Task ID.
    pub id: TaskId,
    /// The list the task belongs to.
    pub list_id: ListId,
    /// The user who created the task.
    pub owner_id: UserId,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Progress.
    pub status: TaskStatus,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or replacing a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Column a task listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    #[default]
    CreatedAt,
    DueDate,
    Title,
    Status,
}

impl TaskSort {
    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "t.created_at",
            Self::DueDate => "t.due_date",
            Self::Title => "t.title",
            Self::Status => "t.status_id",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters for listing the tasks of a list.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Only tasks carrying a tag with this exact label.
    pub tag: Option<String>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    pub due_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
    pub sort: TaskSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

/// Row type for task queries.
#[derive(FromRow)]
struct TaskRow {
    id: i64,
    list_id: i64,
    owner_id: i64,
    title: String,
    description: Option<String>,
    status_id: i16,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TaskRow {
    fn try_into_task(self) -> Result<TodoTask, sqlx::Error> {
        let status = TaskStatus::from_id(self.status_id)
            .ok_or_else(|| decode_error(format!("unknown status id {}", self.status_id)))?;
        Ok(TodoTask {
            id: TaskId::new(self.id),
            list_id: ListId::new(self.list_id),
            owner_id: UserId::new(self.owner_id),
            title: self.title,
            description: self.description,
            status,
            due_date: self.due_date,
            created_at: self.created_at,
        })
    }
}

const TASK_COLUMNS: &str =
    "t.id, t.list_id, t.owner_id, t.title, t.description, t.status_id, t.due_date, t.created_at";

/// Builds the filtered, sorted, paged listing query for a list's tasks.
fn build_list_query(list_id: ListId, filter: &TaskFilter) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new("SELECT ");
    query.push(TASK_COLUMNS);
    query.push(" FROM todo_tasks t WHERE t.list_id = ");
    query.push_bind(list_id.get());

    if let Some(status) = filter.status {
        query.push(" AND t.status_id = ").push_bind(status.id());
    }
    if let Some(tag) = &filter.tag {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM task_tags tt JOIN tags g ON g.id = tt.tag_id \
                 WHERE tt.task_id = t.id AND g.label = ",
            )
            .push_bind(tag.as_str())
            .push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query
            .push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(before) = filter.due_before {
        query.push(" AND t.due_date < ").push_bind(before);
    }
    if let Some(after) = filter.due_after {
        query.push(" AND t.due_date > ").push_bind(after);
    }

    query
        .push(" ORDER BY ")
        .push(filter.sort.column())
        .push(" ")
        .push(filter.order.keyword())
        .push(" NULLS LAST, t.id ")
        .push(filter.order.keyword());
    query.push(" LIMIT ").push_bind(filter.limit);
    query.push(" OFFSET ").push_bind(filter.offset);
    query
}

/// Repository for task operations.
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Creates a new task repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a task in a list.
    #[instrument(skip(self, task))]
    pub async fn create(
        &self,
        list_id: ListId,
        owner_id: UserId,
        task: &NewTask,
    ) -> Result<TodoTask, sqlx::Error> {
        let row: TaskRow = sqlx::query_as(
            r#"
            INSERT INTO todo_tasks AS t (list_id, owner_id, title, description, status_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING t.id, t.list_id, t.owner_id, t.title, t.description, t.status_id, t.due_date, t.created_at
            "#,
        )
        .bind(list_id.get())
        .bind(owner_id.get())
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.status.unwrap_or(TaskStatus::NotStarted).id())
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?;

        row.try_into_task()
    }

    /// Finds a task by ID.
    pub async fn find_by_id(&self, id: TaskId) -> Result<Option<TodoTask>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_tasks t WHERE t.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRow::try_into_task).transpose()
    }

    /// Replaces a task's editable fields. A missing status keeps the current one.
    #[instrument(skip(self, task))]
    pub async fn update(&self, id: TaskId, task: &NewTask) -> Result<Option<TodoTask>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE todo_tasks AS t
            SET title = $2,
                description = $3,
                status_id = COALESCE($4, t.status_id),
                due_date = $5
            WHERE t.id = $1
            RETURNING t.id, t.list_id, t.owner_id, t.title, t.description, t.status_id, t.due_date, t.created_at
            "#,
        )
        .bind(id.get())
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.status.map(|s| s.id()))
        .bind(task.due_date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRow::try_into_task).transpose()
    }

    /// Deletes a task, cascading to its comments and tag links.
    pub async fn delete(&self, id: TaskId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todo_tasks WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists a list's tasks matching `filter`.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        list_id: ListId,
        filter: &TaskFilter,
    ) -> Result<Vec<TodoTask>, sqlx::Error> {
        let rows: Vec<TaskRow> = build_list_query(list_id, filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TaskRow::try_into_task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ids_are_fixed() {
        assert_eq!(TaskStatus::NotStarted.id(), 1);
        assert_eq!(TaskStatus::InProgress.id(), 2);
        assert_eq!(TaskStatus::Completed.id(), 3);
        assert_eq!(TaskStatus::from_id(4), None);
    }

    #[test]
    fn status_parses_loosely() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("Completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("not-started".parse::<TaskStatus>(), Ok(TaskStatus::NotStarted));
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn unfiltered_query_sorts_by_creation() {
        let filter = TaskFilter {
            limit: 20,
            ..TaskFilter::default()
        };
        let sql = build_list_query(ListId::new(1), &filter).sql().to_string();
        assert!(sql.contains("WHERE t.list_id = $1"));
        assert!(sql.contains("ORDER BY t.created_at ASC NULLS LAST, t.id ASC"));
        assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn filters_add_bound_predicates() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            tag: Some("home".to_string()),
            search: Some("milk".to_string()),
            due_before: Some(Utc::now()),
            sort: TaskSort::DueDate,
            order: SortOrder::Desc,
            limit: 10,
            ..TaskFilter::default()
        };
        let sql = build_list_query(ListId::new(1), &filter).sql().to_string();
        assert!(sql.contains("t.status_id = $2"));
        assert!(sql.contains("g.label = $3"));
        assert!(sql.contains("t.title ILIKE $4 OR t.description ILIKE $5"));
        assert!(sql.contains("t.due_date < $6"));
        assert!(!sql.contains("t.due_date >"));
        assert!(sql.contains("ORDER BY t.due_date DESC NULLS LAST"));
    }
}

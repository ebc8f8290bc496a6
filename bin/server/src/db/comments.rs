//! Database repository for task comments.

use chrono::{DateTime, Utc};
use listkeeper_core::{CommentId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A comment on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    task_id: i64,
    author_id: i64,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            task_id: TaskId::new(row.task_id),
            author_id: UserId::new(row.author_id),
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Repository for comment operations.
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Creates a new comment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a task's comments, oldest first.
    pub async fn for_task(&self, task_id: TaskId) -> Result<Vec<Comment>, sqlx::Error> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, author_id, text, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(task_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Finds a comment by ID.
    pub async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, sqlx::Error> {
        let row: Option<CommentRow> = sqlx::query_as(
            "SELECT id, task_id, author_id, text, created_at FROM comments WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    /// Adds a comment to a task.
    pub async fn create(
        &self,
        task_id: TaskId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment, sqlx::Error> {
        let row: CommentRow = sqlx::query_as(
            r#"
            INSERT INTO comments (task_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, text, created_at
            "#,
        )
        .bind(task_id.get())
        .bind(author_id.get())
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Deletes a comment. Returns true if it existed.
    pub async fn delete(&self, id: CommentId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

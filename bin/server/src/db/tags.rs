//! Database repository for task tags.

use listkeeper_core::{TagId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A tag. Labels are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub label: String,
    pub author_id: UserId,
}

#[derive(FromRow)]
struct TagRow {
    id: i64,
    label: String,
    author_id: i64,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: TagId::new(row.id),
            label: row.label,
            author_id: UserId::new(row.author_id),
        }
    }
}

/// Repository for tag operations.
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    /// Creates a new tag repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the tags on a task.
    pub async fn for_task(&self, task_id: TaskId) -> Result<Vec<Tag>, sqlx::Error> {
        let rows: Vec<TagRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.label, g.author_id
            FROM tags g
            JOIN task_tags tt ON tt.tag_id = g.id
            WHERE tt.task_id = $1
            ORDER BY g.label, g.id
            "#,
        )
        .bind(task_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Creates a tag and attaches it to a task in one transaction.
    pub async fn attach_new(
        &self,
        task_id: TaskId,
        label: &str,
        author_id: UserId,
    ) -> Result<Tag, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row: TagRow = sqlx::query_as(
            "INSERT INTO tags (label, author_id) VALUES ($1, $2) RETURNING id, label, author_id",
        )
        .bind(label)
        .bind(author_id.get())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO task_tags (tag_id, task_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(task_id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Detaches a tag from a task. Returns true if a link was removed.
    pub async fn detach(&self, task_id: TaskId, tag_id: TagId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1 AND tag_id = $2")
            .bind(task_id.get())
            .bind(tag_id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

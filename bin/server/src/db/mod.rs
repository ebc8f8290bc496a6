//! Database repositories for the listkeeper server.
//!
//! This module provides data access for:
//! - Users and their token slots (the PostgreSQL credential store)
//! - Lists and role assignments (the PostgreSQL role source)
//! - Tasks, tags, and comments

pub mod comments;
pub mod lists;
pub mod tags;
pub mod tasks;
pub mod users;

pub use comments::{Comment, CommentRepository};
pub use lists::{ListRepository, RoleAssignment, TodoList, VisibleList};
pub use tags::{Tag, TagRepository};
pub use tasks::{NewTask, SortOrder, TaskFilter, TaskRepository, TaskSort, TaskStatus, TodoTask};
pub use users::{PgCredentialStore, UserRepository};

/// Default page size for listing queries.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Converts 1-based `page`/`page_size` query values into `LIMIT`/`OFFSET`.
#[must_use]
pub fn limit_offset(page: Option<u32>, page_size: Option<u32>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let limit = i64::from(size);
    (limit, i64::from(page - 1) * limit)
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Wraps a malformed stored value as a decode error.
fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(limit_offset(None, None), (20, 0));
        assert_eq!(limit_offset(Some(3), Some(10)), (10, 20));
        assert_eq!(limit_offset(Some(0), Some(0)), (1, 0));
        assert_eq!(limit_offset(Some(2), Some(1000)), (100, 100));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("milk"), "%milk%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}

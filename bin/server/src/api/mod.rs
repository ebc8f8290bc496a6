//! REST handlers for lists, roles, tasks, comments, and tags.
//!
//! Every handler runs behind the bearer gate and checks the caller's role
//! before touching data. A denied check answers 404, the same as a missing
//! resource, so callers cannot probe for lists they cannot see.

pub mod comments;
pub mod lists;
pub mod tags;
pub mod tasks;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use listkeeper_auth::AuthenticatedSession;
use listkeeper_authz::{Capability, Role};
use listkeeper_core::{ListId, TaskId};

/// Returns the caller's role on a list if it grants `capability`.
async fn list_role(
    state: &AppState,
    session: &AuthenticatedSession,
    list_id: ListId,
    capability: Capability,
) -> ApiResult<Role> {
    state
        .authorizer
        .permitted_role(session, list_id, capability)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Returns the task's list and the caller's role if it grants `capability`.
async fn task_role(
    state: &AppState,
    session: &AuthenticatedSession,
    task_id: TaskId,
    capability: Capability,
) -> ApiResult<(ListId, Role)> {
    state
        .authorizer
        .permitted_task_role(session, task_id, capability)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Treats an empty query value as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rejects blank required text fields.
fn required(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" milk ".to_string())), Some("milk".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required("title", "Groceries").is_ok());
        assert!(matches!(
            required("title", "   "),
            Err(ApiError::BadRequest { .. })
        ));
    }
}

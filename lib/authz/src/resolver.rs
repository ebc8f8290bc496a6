//! Role resolution and permission checks for lists and tasks.

use crate::error::AuthzError;
use crate::types::{Capability, ListRole, Role};
use async_trait::async_trait;
use listkeeper_auth::AuthenticatedSession;
use listkeeper_core::{ListId, Result, TaskId, UserId};
use tracing::{debug, instrument};

/// Source of list ownership and role assignments.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Returns the owner of a list, or `None` if the list does not exist.
    async fn list_owner(&self, list_id: ListId) -> Result<Option<UserId>, AuthzError>;

    /// Returns the explicit role assigned to a user on a list, if any.
    async fn assigned_role(
        &self,
        list_id: ListId,
        user_id: UserId,
    ) -> Result<Option<ListRole>, AuthzError>;

    /// Returns the list a task belongs to, or `None` if the task does not exist.
    async fn task_list(&self, task_id: TaskId) -> Result<Option<ListId>, AuthzError>;
}

/// Resolves roles and checks capabilities against a [`RoleSource`].
#[derive(Clone)]
pub struct Authorizer<S> {
    source: S,
}

impl<S: RoleSource> Authorizer<S> {
    /// Creates an authorizer.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the role source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves a user's effective role on a list.
    ///
    /// Owner wins over any stored row; a missing list resolves to `None`.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn resolve_role(
        &self,
        session: &AuthenticatedSession,
        list_id: ListId,
    ) -> Result<Role, AuthzError> {
        let user_id = session.user_id();
        let Some(owner) = self.source.list_owner(list_id).await? else {
            debug!("list does not exist");
            return Ok(Role::None);
        };
        if owner == user_id {
            return Ok(Role::Owner);
        }

        let role = self
            .source
            .assigned_role(list_id, user_id)
            .await?
            .map_or(Role::None, Role::from);
        debug!(%role, "resolved list role");
        Ok(role)
    }

    /// Checks whether the user may perform `capability` on the list.
    pub async fn authorize(
        &self,
        session: &AuthenticatedSession,
        list_id: ListId,
        capability: Capability,
    ) -> Result<bool, AuthzError> {
        Ok(self
            .permitted_role(session, list_id, capability)
            .await?
            .is_some())
    }

    /// Returns the user's role if it permits `capability`, otherwise `None`.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn permitted_role(
        &self,
        session: &AuthenticatedSession,
        list_id: ListId,
        capability: Capability,
    ) -> Result<Option<Role>, AuthzError> {
        let role = self.resolve_role(session, list_id).await?;
        let allowed = role.permits(capability);
        debug!(%role, allowed, "list permission check result");
        Ok(allowed.then_some(role))
    }

    /// Checks permission and returns a not-found error if denied.
    pub async fn require(
        &self,
        session: &AuthenticatedSession,
        list_id: ListId,
        capability: Capability,
    ) -> Result<Role, AuthzError> {
        self.permitted_role(session, list_id, capability)
            .await?
            .ok_or_else(|| {
                AuthzError::NotFound {
                    resource: format!("list:{list_id}"),
                }
                .into()
            })
    }

    /// Returns the parent list and the user's role if it permits
    /// `capability` on the task, otherwise `None`.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn permitted_task_role(
        &self,
        session: &AuthenticatedSession,
        task_id: TaskId,
        capability: Capability,
    ) -> Result<Option<(ListId, Role)>, AuthzError> {
        let Some(list_id) = self.source.task_list(task_id).await? else {
            debug!("task does not exist");
            return Ok(None);
        };
        Ok(self
            .permitted_role(session, list_id, capability)
            .await?
            .map(|role| (list_id, role)))
    }

    /// Checks whether the user may perform `capability` on the task.
    pub async fn authorize_task(
        &self,
        session: &AuthenticatedSession,
        task_id: TaskId,
        capability: Capability,
    ) -> Result<bool, AuthzError> {
        Ok(self
            .permitted_task_role(session, task_id, capability)
            .await?
            .is_some())
    }

    /// Checks task permission and returns a not-found error if denied.
    pub async fn require_task(
        &self,
        session: &AuthenticatedSession,
        task_id: TaskId,
        capability: Capability,
    ) -> Result<(ListId, Role), AuthzError> {
        self.permitted_task_role(session, task_id, capability)
            .await?
            .ok_or_else(|| {
                AuthzError::NotFound {
                    resource: format!("task:{task_id}"),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryRoles {
        owners: HashMap<ListId, UserId>,
        roles: HashMap<(ListId, UserId), ListRole>,
        tasks: HashMap<TaskId, ListId>,
    }

    #[async_trait]
    impl RoleSource for InMemoryRoles {
        async fn list_owner(&self, list_id: ListId) -> Result<Option<UserId>, AuthzError> {
            Ok(self.owners.get(&list_id).copied())
        }

        async fn assigned_role(
            &self,
            list_id: ListId,
            user_id: UserId,
        ) -> Result<Option<ListRole>, AuthzError> {
            Ok(self.roles.get(&(list_id, user_id)).copied())
        }

        async fn task_list(&self, task_id: TaskId) -> Result<Option<ListId>, AuthzError> {
            Ok(self.tasks.get(&task_id).copied())
        }
    }

    const LIST: ListId = ListId::new(1);
    const TASK: TaskId = TaskId::new(10);
    const OWNER: UserId = UserId::new(1);
    const EDITOR: UserId = UserId::new(2);
    const VIEWER: UserId = UserId::new(3);
    const STRANGER: UserId = UserId::new(4);

    fn session(user_id: UserId) -> AuthenticatedSession {
        AuthenticatedSession::new(user_id, format!("user{user_id}"))
    }

    fn authorizer() -> Authorizer<InMemoryRoles> {
        let mut source = InMemoryRoles::default();
        source.owners.insert(LIST, OWNER);
        source.roles.insert((LIST, EDITOR), ListRole::Editor);
        source.roles.insert((LIST, VIEWER), ListRole::Viewer);
        source.tasks.insert(TASK, LIST);
        Authorizer::new(source)
    }

    #[tokio::test]
    async fn owner_without_row_has_full_access() {
        let authz = authorizer();
        let owner = session(OWNER);
        assert_eq!(authz.resolve_role(&owner, LIST).await.unwrap(), Role::Owner);
        for capability in [
            Capability::Read,
            Capability::Write,
            Capability::Delete,
            Capability::ManageRoles,
        ] {
            assert!(authz.authorize(&owner, LIST, capability).await.unwrap());
        }
    }

    #[tokio::test]
    async fn owner_wins_over_stored_row() {
        let mut source = InMemoryRoles::default();
        source.owners.insert(LIST, OWNER);
        source.roles.insert((LIST, OWNER), ListRole::Viewer);
        let authz = Authorizer::new(source);
        assert_eq!(
            authz.resolve_role(&session(OWNER), LIST).await.unwrap(),
            Role::Owner
        );
    }

    #[tokio::test]
    async fn editor_cannot_delete_or_manage_roles() {
        let authz = authorizer();
        let editor = session(EDITOR);
        assert!(authz.authorize(&editor, LIST, Capability::Write).await.unwrap());
        assert!(!authz.authorize(&editor, LIST, Capability::Delete).await.unwrap());
        assert!(
            !authz
                .authorize(&editor, LIST, Capability::ManageRoles)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn viewer_is_read_only() {
        let authz = authorizer();
        let viewer = session(VIEWER);
        assert!(authz.authorize(&viewer, LIST, Capability::Read).await.unwrap());
        assert!(!authz.authorize(&viewer, LIST, Capability::Write).await.unwrap());
    }

    #[tokio::test]
    async fn stranger_denial_matches_missing_list() {
        let authz = authorizer();
        let stranger = session(STRANGER);

        let denied = authz.require(&stranger, LIST, Capability::Read).await;
        let missing = authz
            .require(&session(OWNER), ListId::new(999), Capability::Read)
            .await;

        let denied = denied.unwrap_err().to_string();
        let missing = missing.unwrap_err().to_string();
        assert!(denied.contains("not found"));
        assert!(missing.contains("not found"));
    }

    #[tokio::test]
    async fn task_inherits_list_role() {
        let authz = authorizer();
        let (list_id, role) = authz
            .require_task(&session(EDITOR), TASK, Capability::Write)
            .await
            .unwrap();
        assert_eq!(list_id, LIST);
        assert_eq!(role, Role::Editor);

        assert!(
            !authz
                .authorize_task(&session(VIEWER), TASK, Capability::Write)
                .await
                .unwrap()
        );
        assert!(
            !authz
                .authorize_task(&session(STRANGER), TASK, Capability::Read)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let authz = authorizer();
        let result = authz
            .require_task(&session(OWNER), TaskId::new(404), Capability::Read)
            .await;
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}

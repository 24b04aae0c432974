//! Public API trait for the workspace resolver.

use async_trait::async_trait;

use crate::error::WorkspaceResolverError;
use crate::models::{UserIdentity, WorkspaceDescriptor};

/// Public API trait for the workspace resolver.
///
/// ```ignore
/// let workspaces = resolver.get_permitted_workspaces(&user).await?;
///
/// // After the user's group memberships changed upstream
/// resolver.invalidate(&user.user_id);
/// ```
#[async_trait]
pub trait WorkspaceResolverClient: Send + Sync {
    /// Resolve the workspaces `user` may launch, sorted by slug.
    ///
    /// Claims outside the parent scope are skipped. Results may come from
    /// the result cache when one is configured.
    ///
    /// # Errors
    ///
    /// - `NoPermittedWorkspaces` if no claim maps to a workspace
    /// - `GroupNotFound` if a claim or the parent scope is missing upstream
    /// - `UnexpectedResponseStatus` / `DirectoryUnavailable` if the directory fails
    /// - `InvalidGroup` / `InvalidDate` if a group payload is malformed
    async fn get_permitted_workspaces(
        &self,
        user: &UserIdentity,
    ) -> Result<Vec<WorkspaceDescriptor>, WorkspaceResolverError>;

    /// Drop cached resolutions for the given user id.
    ///
    /// A no-op when no cache is configured.
    fn invalidate(&self, user_id: &str);
}

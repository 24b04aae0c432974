//! Local (in-process) client for the workspace resolver module.

use std::sync::Arc;

use async_trait::async_trait;
use workspace_resolver_sdk::{
    UserIdentity, WorkspaceDescriptor, WorkspaceResolverClient, WorkspaceResolverError,
};

use super::{DomainError, Service};

/// Local client wrapping the resolver service.
pub struct WorkspaceResolverLocalClient {
    svc: Arc<Service>,
}

impl WorkspaceResolverLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> WorkspaceResolverError {
    match &e {
        DomainError::NoPermittedWorkspaces { .. } => {
            tracing::info!(operation = op, error = %e, "workspace-resolver call found nothing");
        }
        _ => tracing::error!(operation = op, error = ?e, "workspace-resolver call failed"),
    }
    e.into()
}

#[async_trait]
impl WorkspaceResolverClient for WorkspaceResolverLocalClient {
    async fn get_permitted_workspaces(
        &self,
        user: &UserIdentity,
    ) -> Result<Vec<WorkspaceDescriptor>, WorkspaceResolverError> {
        self.svc
            .resolve_permitted_workspaces(user)
            .await
            .map_err(|e| log_and_convert("get_permitted_workspaces", e))
    }

    fn invalidate(&self, user_id: &str) {
        let removed = self.svc.invalidate(user_id);
        tracing::debug!(user = user_id, removed, "invalidated cached workspaces");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::WorkspaceResolverConfig;
    use crate::domain::directory::{DirectoryClient, DirectoryError};
    use serde_json::{Value, json};
    use workspace_resolver_sdk::ClaimSet;

    struct FailingDirectory;

    #[async_trait]
    impl DirectoryClient for FailingDirectory {
        async fn query(&self, _path: &str) -> Result<Value, DirectoryError> {
            Err(DirectoryError::UnexpectedResponseStatus {
                received: 503,
                expected: 200,
            })
        }
    }

    struct EmptyDirectory;

    #[async_trait]
    impl DirectoryClient for EmptyDirectory {
        async fn query(&self, path: &str) -> Result<Value, DirectoryError> {
            Ok(if path.ends_with("/children") {
                json!([])
            } else {
                json!([{"id": "p1", "name": "jupyter-workspaces"}])
            })
        }
    }

    fn client(directory: Arc<dyn DirectoryClient>) -> WorkspaceResolverLocalClient {
        let svc = Service::new(directory, &WorkspaceResolverConfig::default());
        WorkspaceResolverLocalClient::new(Arc::new(svc))
    }

    #[tokio::test]
    async fn test_directory_failure_maps_to_sdk_status_error() {
        let client = client(Arc::new(FailingDirectory));
        let user = UserIdentity::new("alice", ClaimSet::default());

        let err = client.get_permitted_workspaces(&user).await.unwrap_err();
        assert!(matches!(
            err,
            WorkspaceResolverError::UnexpectedResponseStatus { received: 503, expected: 200 }
        ));
    }

    #[tokio::test]
    async fn test_no_workspaces_maps_to_sdk_error() {
        let client = client(Arc::new(EmptyDirectory));
        let user = UserIdentity::new("alice", ClaimSet::default());

        let err = client.get_permitted_workspaces(&user).await.unwrap_err();
        assert!(err.is_no_permitted_workspaces());

        client.invalidate("alice");
    }
}

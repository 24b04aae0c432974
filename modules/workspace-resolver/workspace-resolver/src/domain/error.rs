//! Domain error types for the workspace resolver.

use thiserror::Error;
use workspace_resolver_sdk::WorkspaceResolverError;

use super::directory::DirectoryError;
use super::group::GroupConversionError;

/// Domain-level errors for the workspace resolver.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A claim does not begin with `/<parent>/`.
    ///
    /// Never returned by a resolution: the claim is logged and skipped.
    #[error("group path '{claim}' does not begin with /{parent}/")]
    InvalidGroupPath { claim: String, parent: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    GroupConversion(#[from] GroupConversionError),

    #[error("could not find the group: {name}")]
    GroupNotFound { name: String },

    #[error("user {user} does not have any valid workspaces assigned")]
    NoPermittedWorkspaces { user: String },

    #[error("invalid date '{value}', expected YYYY-MM-DD: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

impl DomainError {
    #[must_use]
    pub fn group_not_found(name: impl Into<String>) -> Self {
        Self::GroupNotFound { name: name.into() }
    }
}

impl From<DomainError> for WorkspaceResolverError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NoPermittedWorkspaces { user } => {
                WorkspaceResolverError::NoPermittedWorkspaces { user }
            }
            DomainError::GroupNotFound { name } => WorkspaceResolverError::GroupNotFound { name },
            DomainError::Directory(DirectoryError::UnexpectedResponseStatus {
                received,
                expected,
            }) => WorkspaceResolverError::UnexpectedResponseStatus { received, expected },
            DomainError::Directory(other) => {
                WorkspaceResolverError::DirectoryUnavailable(other.to_string())
            }
            DomainError::GroupConversion(e) => WorkspaceResolverError::InvalidGroup(e.to_string()),
            err @ DomainError::InvalidGroupPath { .. } => {
                WorkspaceResolverError::InvalidGroup(err.to_string())
            }
            DomainError::InvalidDate { value, source } => WorkspaceResolverError::InvalidDate {
                value,
                reason: source.to_string(),
            },
        }
    }
}

//! Error types for the workspace resolver module.

use thiserror::Error;

/// Errors that can occur when using the workspace resolver API.
#[derive(Debug, Error)]
pub enum WorkspaceResolverError {
    /// None of the user's claims maps to a workspace.
    #[error("no permitted workspaces for user '{user}'")]
    NoPermittedWorkspaces {
        /// The user id the resolution ran for.
        user: String,
    },

    /// The parent scope or a claimed group does not exist in the directory.
    #[error("group not found: {name}")]
    GroupNotFound {
        /// Group name or claimed path that was looked up.
        name: String,
    },

    /// The directory answered with a status other than the expected one.
    #[error("unexpected directory response status: received {received}, expected {expected}")]
    UnexpectedResponseStatus {
        /// Status code received.
        received: u16,
        /// Status code expected.
        expected: u16,
    },

    /// The directory could not be reached or returned an unreadable body.
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// A group payload lacked required fields.
    #[error("invalid group: {0}")]
    InvalidGroup(String),

    /// A workspace date attribute is not `YYYY-MM-DD`.
    #[error("invalid workspace date '{value}': {reason}")]
    InvalidDate {
        /// The raw attribute value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl WorkspaceResolverError {
    /// `true` when the user simply has no workspace, as opposed to a failure.
    #[must_use]
    pub fn is_no_permitted_workspaces(&self) -> bool {
        matches!(self, Self::NoPermittedWorkspaces { .. })
    }

    /// `true` for failures of the directory itself (status, transport, body).
    #[must_use]
    pub fn is_directory_failure(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedResponseStatus { .. } | Self::DirectoryUnavailable(_)
        )
    }
}

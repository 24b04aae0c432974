//! Workspace Resolver SDK
//!
//! This crate provides the public API for the `workspace-resolver` module:
//!
//! - [`WorkspaceResolverClient`] - Public API trait for consumers
//! - [`WorkspaceDescriptor`], [`ClaimSet`], [`UserIdentity`] - Models
//! - [`WorkspaceResolverError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use workspace_resolver_sdk::{ClaimSet, UserIdentity, WorkspaceResolverClient};
//!
//! let claims = ClaimSet::from_userinfo(&userinfo, "realm_groups");
//! let user = UserIdentity::new("alice", claims);
//!
//! let workspaces = resolver.get_permitted_workspaces(&user).await?;
//! for ws in &workspaces {
//!     println!("{} ({} days left)", ws.display_name, ws.ws_days_left);
//! }
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::WorkspaceResolverClient;
pub use error::WorkspaceResolverError;
pub use models::{ClaimSet, DEFAULT_GROUPS_CLAIM, UserIdentity, WorkspaceDescriptor};

//! Workspace Resolver Module
//!
//! Maps the group claims of a signed-in user onto the workspaces the
//! spawner may launch for them. Groups are looked up in the identity
//! provider (Keycloak admin REST API) under a parent scope; each matching
//! child group becomes a [`WorkspaceDescriptor`](workspace_resolver_sdk::WorkspaceDescriptor).
//!
//! The module provides the `WorkspaceResolverClient` implementation
//! [`domain::WorkspaceResolverLocalClient`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{DirectoryConfig, WorkspaceResolverConfig};
pub use domain::{Service, WorkspaceResolverLocalClient};

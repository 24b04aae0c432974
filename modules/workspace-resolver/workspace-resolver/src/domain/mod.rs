//! Domain layer for the workspace resolver.

pub mod cache;
pub mod directory;
pub mod error;
pub mod group;
pub mod local_client;
pub mod service;

pub use cache::WorkspaceCache;
pub use directory::{DirectoryClient, DirectoryError, HttpDirectoryClient};
pub use error::DomainError;
pub use group::{AttributeKeys, GroupConversionError, GroupRecord};
pub use local_client::WorkspaceResolverLocalClient;
pub use service::Service;

//! Workspace resolution: claims to directory groups to workspace descriptors.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use workspace_resolver_sdk::{UserIdentity, WorkspaceDescriptor};

use super::cache::WorkspaceCache;
use super::directory::{DirectoryClient, DirectoryError, HttpDirectoryClient};
use super::error::DomainError;
use super::group::{AttributeKeys, GroupConversionError, GroupRecord, empty_override};
use crate::config::WorkspaceResolverConfig;

/// Resolves the workspaces a user may launch.
///
/// Every resolution issues its directory requests one after another:
/// parent lookup, then the parent's children. Nothing is retried.
pub struct Service {
    directory: Arc<dyn DirectoryClient>,
    environments: BTreeMap<String, Value>,
    parent_group: String,
    attribute_keys: AttributeKeys,
    cache: Option<Arc<WorkspaceCache>>,
}

impl Service {
    /// Creates a service over `directory`, with a fresh cache when
    /// `config.cache_results` is set.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryClient>, config: &WorkspaceResolverConfig) -> Self {
        Self {
            directory,
            environments: config.environments.clone(),
            parent_group: config.parent_group.clone(),
            attribute_keys: AttributeKeys::for_namespace(&config.attribute_namespace),
            cache: config
                .cache_results
                .then(|| Arc::new(WorkspaceCache::new())),
        }
    }

    /// Creates a service talking to the directory described in `config`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Directory` if the HTTP client cannot be built
    /// (e.g. unreadable CA bundle).
    pub fn from_config(config: &WorkspaceResolverConfig) -> Result<Self, DomainError> {
        let directory = HttpDirectoryClient::from_config(&config.directory)?;
        tracing::info!(
            base_url = %config.directory.base_url,
            parent_group = %config.parent_group,
            environments = config.environments.len(),
            "workspace resolver configured"
        );
        Ok(Self::new(Arc::new(directory), config))
    }

    /// Replace the result cache, e.g. with one shared across services.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<Arc<WorkspaceCache>>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn cache(&self) -> Option<&Arc<WorkspaceCache>> {
        self.cache.as_ref()
    }

    /// Flat group listing with hierarchy populated.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Directory` if the request fails or the body is
    /// not a JSON array.
    pub async fn fetch_all_groups(&self) -> Result<Vec<Value>, DomainError> {
        let path = "/groups?populateHierarchy=true";
        let body = self.directory.query(path).await?;
        into_array(path, body)
    }

    /// A single group by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Directory` on request failure and
    /// `DomainError::GroupConversion` if the payload is not a valid group.
    pub async fn fetch_group(&self, group_id: &str) -> Result<GroupRecord, DomainError> {
        let body = self.directory.query(&format!("/groups/{group_id}")).await?;
        Ok(GroupRecord::from_raw(&body, &self.attribute_keys)?)
    }

    /// First group of the flat listing whose `name` equals `name` exactly.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GroupNotFound` if no group matches.
    pub async fn find_group_by_name(&self, name: &str) -> Result<Value, DomainError> {
        self.fetch_all_groups()
            .await?
            .into_iter()
            .find(|group| group.get("name").and_then(Value::as_str) == Some(name))
            .ok_or_else(|| DomainError::group_not_found(name))
    }

    /// Children of `group_id`, keyed by case-folded path.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GroupConversion` if any child is not a valid
    /// group, besides the errors of the request itself.
    pub async fn fetch_children(
        &self,
        group_id: &str,
    ) -> Result<HashMap<String, GroupRecord>, DomainError> {
        let path = format!("/groups/{group_id}/children");
        let body = self.directory.query(&path).await?;

        let mut children = HashMap::new();
        for raw in into_array(&path, body)? {
            let record = GroupRecord::from_raw(&raw, &self.attribute_keys)?;
            children.insert(fold_path(&record.path), record);
        }
        tracing::debug!(group_id, count = children.len(), "fetched child groups");
        Ok(children)
    }

    /// Workspaces the user may launch, sorted by slug.
    ///
    /// Claims outside `/<parent_group>/` are logged and skipped. A hit in the
    /// result cache skips the directory entirely.
    ///
    /// # Errors
    ///
    /// - `GroupNotFound` if the parent scope or an in-scope claim is unknown
    /// - `NoPermittedWorkspaces` if no claim yields a workspace
    /// - `Directory`, `GroupConversion`, `InvalidDate` on upstream problems
    #[tracing::instrument(skip_all, fields(user = %user.user_id, claims = user.claims.len()))]
    pub async fn resolve_permitted_workspaces(
        &self,
        user: &UserIdentity,
    ) -> Result<Vec<WorkspaceDescriptor>, DomainError> {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(user)) {
            tracing::debug!(count = cached.len(), "workspaces served from cache");
            return Ok(cached);
        }

        let parent = self.find_group_by_name(&self.parent_group).await?;
        let parent_id = parent
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GroupConversionError {
                raw: parent.clone(),
                reason: "id not present",
            })?;
        let available = self.fetch_children(parent_id).await?;

        let prefix = format!("/{}/", self.parent_group);
        let no_override = empty_override();
        let mut workspaces = Vec::new();

        for claim in user.claims.paths() {
            if !claim.starts_with(&prefix) {
                let skipped = DomainError::InvalidGroupPath {
                    claim: claim.to_owned(),
                    parent: self.parent_group.clone(),
                };
                tracing::warn!(error = %skipped, "skipping claim outside the parent scope");
                continue;
            }

            let group = available
                .get(&fold_path(claim))
                .ok_or_else(|| DomainError::group_not_found(claim))?;

            tracing::debug!(
                slug = %group.workspace_name,
                environment = %group.environment_name,
                "matched workspace group"
            );
            let spawner_override = self
                .environments
                .get(&group.environment_name)
                .unwrap_or(&no_override);
            workspaces.push(group.to_workspace_descriptor(spawner_override)?);
        }

        if workspaces.is_empty() {
            return Err(DomainError::NoPermittedWorkspaces {
                user: user.user_id.clone(),
            });
        }

        sort_by_slug(&mut workspaces);
        tracing::info!(count = workspaces.len(), "resolved permitted workspaces");

        if let Some(cache) = &self.cache {
            cache.insert(user, workspaces.clone());
        }
        Ok(workspaces)
    }

    /// Drop cached resolutions of `user_id`; returns how many were removed.
    #[must_use]
    pub fn invalidate(&self, user_id: &str) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.invalidate(user_id))
    }
}

/// Ascending by slug; descriptors with an empty slug go last.
fn sort_by_slug(workspaces: &mut [WorkspaceDescriptor]) {
    workspaces.sort_by(|a, b| {
        (a.slug.is_empty(), &a.slug).cmp(&(b.slug.is_empty(), &b.slug))
    });
}

/// Full Unicode case folding, so `ß` and `SS` compare equal.
fn fold_path(path: &str) -> String {
    caseless::default_case_fold_str(path)
}

fn into_array(path: &str, body: Value) -> Result<Vec<Value>, DomainError> {
    match body {
        Value::Array(items) => Ok(items),
        _ => Err(DirectoryError::UnexpectedBody {
            path: path.to_owned(),
            expected: "array",
        }
        .into()),
    }
}

//! Configuration for the workspace resolver module.

use std::collections::BTreeMap;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use workspace_resolver_sdk::DEFAULT_GROUPS_CLAIM;

/// Name of the directory group all workspace groups are nested under.
pub const DEFAULT_PARENT_GROUP: &str = "jupyter-workspaces";

/// Prefix of the group attributes describing a workspace.
pub const DEFAULT_ATTRIBUTE_NAMESPACE: &str = "workspace.xlscsde.nhs.uk";

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceResolverConfig {
    /// Identity provider connection.
    pub directory: DirectoryConfig,

    /// Parent scope; claims must start with `/<parent_group>/`.
    pub parent_group: String,

    /// User-info claim holding the user's group paths.
    pub groups_claim: String,

    /// Attribute key prefix, e.g. `<namespace>/environment`.
    pub attribute_namespace: String,

    /// Spawner overrides per environment name.
    ///
    /// A workspace whose environment is not listed gets an empty override.
    /// Each override must be a mapping; anything else fails the load.
    #[serde(deserialize_with = "deserialize_environments")]
    pub environments: BTreeMap<String, Value>,

    /// Memoize resolutions per (user, claims).
    ///
    /// Entries expire at the next UTC date change, so a user's group changes
    /// in the directory can take until then to show up.
    pub cache_results: bool,
}

impl Default for WorkspaceResolverConfig {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            parent_group: DEFAULT_PARENT_GROUP.to_owned(),
            groups_claim: DEFAULT_GROUPS_CLAIM.to_owned(),
            attribute_namespace: DEFAULT_ATTRIBUTE_NAMESPACE.to_owned(),
            environments: BTreeMap::new(),
            cache_results: true,
        }
    }
}

impl WorkspaceResolverConfig {
    /// JSON view of the configuration with the access token masked.
    #[must_use]
    pub fn redacted(&self) -> Value {
        json!({
            "directory": self.directory.redacted(),
            "parent_group": self.parent_group,
            "groups_claim": self.groups_claim,
            "attribute_namespace": self.attribute_namespace,
            "environments": self.environments,
            "cache_results": self.cache_results,
        })
    }
}

fn deserialize_environments<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let environments = BTreeMap::<String, Value>::deserialize(deserializer)?;
    if let Some(name) = environments
        .iter()
        .find_map(|(name, value)| (!value.is_object()).then_some(name))
    {
        return Err(D::Error::custom(format_args!(
            "environment '{name}' must map spawner settings to values"
        )));
    }
    Ok(environments)
}

/// Connection settings for the identity provider admin API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Realm admin base URL, e.g. `https://sso.example.org/admin/realms/main`.
    pub base_url: String,

    /// Bearer token sent with every directory request.
    pub access_token: SecretString,

    /// PEM bundle the server certificate is verified against.
    ///
    /// `null` trusts the bundled Mozilla roots instead.
    pub ca_bundle: Option<PathBuf>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Accept `http://` base URLs (mock directories only).
    pub allow_insecure_http: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: SecretString::from(String::new()),
            ca_bundle: Some(PathBuf::from(resolver_http::DEFAULT_CA_BUNDLE)),
            timeout_secs: 30,
            allow_insecure_http: false,
        }
    }
}

impl DirectoryConfig {
    fn redacted(&self) -> Value {
        json!({
            "base_url": self.base_url,
            "access_token": "[REDACTED]",
            "ca_bundle": self.ca_bundle.as_ref().map(|p| p.display().to_string()),
            "timeout_secs": self.timeout_secs,
            "allow_insecure_http": self.allow_insecure_http,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = WorkspaceResolverConfig::default();
        assert_eq!(config.parent_group, "jupyter-workspaces");
        assert_eq!(config.groups_claim, "realm_groups");
        assert_eq!(config.attribute_namespace, "workspace.xlscsde.nhs.uk");
        assert!(config.environments.is_empty());
        assert_eq!(
            config.directory.ca_bundle,
            Some(PathBuf::from("/etc/ssl/certs/ca-certificates.crt"))
        );
        assert_eq!(config.directory.timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: WorkspaceResolverConfig = serde_json::from_value(json!({
            "directory": {
                "base_url": "https://sso.example.org/admin/realms/main",
                "access_token": "s3cr3t"
            },
            "environments": {
                "jupyter_advanced": {"image": "jupyter/advanced:1.0", "cpu_limit": 2}
            }
        }))
        .unwrap();

        assert_eq!(config.directory.access_token.expose_secret(), "s3cr3t");
        assert_eq!(config.directory.timeout_secs, 30);
        assert_eq!(config.parent_group, DEFAULT_PARENT_GROUP);
        assert_eq!(
            config.environments["jupyter_advanced"]["image"],
            "jupyter/advanced:1.0"
        );
    }

    #[test]
    fn test_non_mapping_environment_rejected() {
        let err = serde_json::from_value::<WorkspaceResolverConfig>(json!({
            "environments": {
                "jupyter_advanced": {"image": "jupyter/advanced:1.0"},
                "jupyter_default": "img"
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("environment 'jupyter_default'"), "{err}");

        let err = serde_json::from_value::<WorkspaceResolverConfig>(json!({
            "environments": {"jupyter_default": null}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("jupyter_default"), "{err}");
    }

    #[test]
    fn test_null_ca_bundle() {
        let config: WorkspaceResolverConfig =
            serde_json::from_value(json!({"directory": {"ca_bundle": null}})).unwrap();
        assert_eq!(config.directory.ca_bundle, None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<WorkspaceResolverConfig, _> =
            serde_json::from_value(json!({"parent": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_redacted_hides_token() {
        let config: WorkspaceResolverConfig = serde_json::from_value(json!({
            "directory": {"access_token": "s3cr3t"}
        }))
        .unwrap();

        let rendered = config.redacted().to_string();
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }
}

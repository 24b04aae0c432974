//! Models for the workspace resolver API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the user-info claim carrying group paths, unless configured otherwise.
pub const DEFAULT_GROUPS_CLAIM: &str = "realm_groups";

/// A workspace the user may launch.
///
/// Serialized with the keys the spawner's profile list expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    /// Human-readable name (last segment of the group path).
    pub display_name: String,
    /// Spawner overrides for the workspace's environment, with
    /// `extra_labels.workspace` set to the slug.
    pub kubespawner_override: Value,
    /// Lowercased, hyphenated display name.
    pub slug: String,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`.
    pub end_date: String,
    pub description: String,
    /// Whole days until `end_date`; negative once expired.
    pub ws_days_left: i64,
}

/// Group paths asserted by the identity provider about a user.
///
/// Order and duplicates are kept as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<String>);

impl ClaimSet {
    #[must_use]
    pub fn new(claims: Vec<String>) -> Self {
        Self(claims)
    }

    /// Extract the claim set from an OAuth user-info document.
    ///
    /// A missing or non-array claim yields an empty set; non-string entries
    /// are ignored.
    #[must_use]
    pub fn from_userinfo(userinfo: &Value, claim: &str) -> Self {
        let claims = userinfo
            .get(claim)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Self(claims)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable 64-bit fingerprint of the ordered claims (xxh3).
    ///
    /// Used as part of the result cache key.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut buf = Vec::with_capacity(self.0.iter().map(|c| c.len() + 1).sum());
        for claim in &self.0 {
            buf.extend_from_slice(claim.as_bytes());
            buf.push(0);
        }
        xxhash_rust::xxh3::xxh3_64(&buf)
    }
}

impl From<Vec<String>> for ClaimSet {
    fn from(claims: Vec<String>) -> Self {
        Self(claims)
    }
}

impl<'a> FromIterator<&'a str> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

/// Requesting user: id plus the claims presented for this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub claims: ClaimSet,
}

impl UserIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<String>, claims: ClaimSet) -> Self {
        Self {
            user_id: user_id.into(),
            claims,
        }
    }
}

//! Directory group records and their projection into workspace descriptors.

use serde_json::{Map, Value, json};
use thiserror::Error;
use time::Date;
use time::macros::format_description;
use workspace_resolver_sdk::WorkspaceDescriptor;

use super::error::DomainError;

const DEFAULT_ENVIRONMENT: &str = "jupyter_default";
const DEFAULT_DATE: &str = "1900-01-01";
const DEFAULT_DESCRIPTION: &str = "No description provided";

/// A raw group payload lacked something a workspace needs.
#[derive(Debug, Error)]
#[error("error converting the group definition: {reason}")]
pub struct GroupConversionError {
    /// The payload as received.
    pub raw: Value,
    pub reason: &'static str,
}

/// Attribute keys a group's workspace settings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeKeys {
    pub environment: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl AttributeKeys {
    #[must_use]
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            environment: format!("{namespace}/environment"),
            start_date: format!("{namespace}/startDate"),
            end_date: format!("{namespace}/endDate"),
            description: format!("{namespace}/description"),
        }
    }
}

/// A directory group validated for use as a workspace.
///
/// `id`, `path`, `display_name` and `workspace_name` are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: String,
    pub path: String,
    pub display_name: String,
    /// Slug: display name lowercased, spaces replaced with hyphens.
    pub workspace_name: String,
    pub environment_name: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl GroupRecord {
    /// Build a record from a Keycloak group representation.
    ///
    /// # Errors
    ///
    /// Returns `GroupConversionError` if `id` or `path` is missing or empty,
    /// or if the derived display name or slug is empty.
    pub fn from_raw(raw: &Value, keys: &AttributeKeys) -> Result<Self, GroupConversionError> {
        let fail = |reason| GroupConversionError {
            raw: raw.clone(),
            reason,
        };

        let id = non_empty_str(raw.get("id")).ok_or_else(|| fail("id not present"))?;
        let path = non_empty_str(raw.get("path")).ok_or_else(|| fail("path not present"))?;

        let display_name = path.rsplit_once('/').map_or(path, |(_, last)| last);
        if display_name.is_empty() {
            return Err(fail("display_name not present"));
        }
        let workspace_name = display_name.to_lowercase().replace(' ', "-");
        if workspace_name.is_empty() {
            return Err(fail("workspace_name not present"));
        }

        let attributes = raw.get("attributes").and_then(Value::as_object);
        let attribute = |key: &str, default: &str| -> String {
            attributes
                .and_then(|attrs| attrs.get(key))
                .and_then(Value::as_array)
                .and_then(|values| values.first())
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_owned()
        };

        Ok(Self {
            id: id.to_owned(),
            path: path.to_owned(),
            display_name: display_name.to_owned(),
            environment_name: attribute(&keys.environment, DEFAULT_ENVIRONMENT),
            start_date: attribute(&keys.start_date, DEFAULT_DATE),
            end_date: attribute(&keys.end_date, DEFAULT_DATE),
            description: attribute(&keys.description, DEFAULT_DESCRIPTION),
            workspace_name,
        })
    }

    /// Whole days from today (UTC) until the end date; negative once expired.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDate` if the end date is not `YYYY-MM-DD`.
    pub fn days_until_expiry(&self) -> Result<i64, DomainError> {
        self.days_until_expiry_from(today())
    }

    /// Whole days from `today` until the end date.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDate` if the end date is not `YYYY-MM-DD`.
    pub fn days_until_expiry_from(&self, today: Date) -> Result<i64, DomainError> {
        let end = parse_date(&self.end_date)?;
        Ok((end - today).whole_days())
    }

    /// Project the record into a descriptor using today's date.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDate` if the end date is malformed.
    pub fn to_workspace_descriptor(
        &self,
        override_config: &Value,
    ) -> Result<WorkspaceDescriptor, DomainError> {
        self.to_workspace_descriptor_at(override_config, today())
    }

    /// Project the record into a descriptor as seen on `today`.
    ///
    /// `override_config` is copied; its `extra_labels` is replaced by
    /// `{"workspace": <slug>}`. A non-object override is logged and treated
    /// as empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDate` if the end date is malformed.
    pub fn to_workspace_descriptor_at(
        &self,
        override_config: &Value,
        today: Date,
    ) -> Result<WorkspaceDescriptor, DomainError> {
        let mut spawner_override = if let Value::Object(map) = override_config {
            map.clone()
        } else {
            tracing::warn!(
                workspace = %self.workspace_name,
                value = %override_config,
                "spawner override is not an object, using an empty one"
            );
            Map::new()
        };
        spawner_override.insert(
            "extra_labels".to_owned(),
            json!({ "workspace": self.workspace_name }),
        );

        Ok(WorkspaceDescriptor {
            display_name: self.display_name.clone(),
            kubespawner_override: Value::Object(spawner_override),
            slug: self.workspace_name.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            description: self.description.clone(),
            ws_days_left: self.days_until_expiry_from(today)?,
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn today() -> Date {
    time::OffsetDateTime::now_utc().date()
}

fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::InvalidDate {
            value: value.to_owned(),
            source: e,
        }
    })
}

/// Empty override used for environments without configuration.
pub(crate) fn empty_override() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use time::macros::date;
    use tracing_test::traced_test;

    fn keys() -> AttributeKeys {
        AttributeKeys::for_namespace("workspace.xlscsde.nhs.uk")
    }

    fn colorectal() -> Value {
        json!({
            "id": "79cdf13c-a6bc-46cd-8a5d-1281b0fe8e53",
            "name": "Colorectal Cancer Research Group Workspace",
            "path": "/jupyter-workspaces/Colorectal Cancer Research Group Workspace",
            "attributes": {
                "workspace.xlscsde.nhs.uk/environment": ["jupyter_advanced"],
                "workspace.xlscsde.nhs.uk/startDate": ["2022-01-01"],
                "workspace.xlscsde.nhs.uk/endDate": ["2030-01-01"],
                "workspace.xlscsde.nhs.uk/description": ["Bowel cancer cohort analysis"]
            },
            "subGroups": []
        })
    }

    #[test]
    fn test_from_raw_reads_attributes() {
        let group = GroupRecord::from_raw(&colorectal(), &keys()).unwrap();

        assert_eq!(group.id, "79cdf13c-a6bc-46cd-8a5d-1281b0fe8e53");
        assert_eq!(group.display_name, "Colorectal Cancer Research Group Workspace");
        assert_eq!(
            group.workspace_name,
            "colorectal-cancer-research-group-workspace"
        );
        assert_eq!(group.environment_name, "jupyter_advanced");
        assert_eq!(group.start_date, "2022-01-01");
        assert_eq!(group.end_date, "2030-01-01");
        assert_eq!(group.description, "Bowel cancer cohort analysis");
    }

    #[test]
    fn test_from_raw_defaults_without_attributes() {
        let raw = json!({
            "id": "a6fdb60b-f11d-4c59-bdf3-e03fac24b6ab",
            "path": "/jupyter-workspaces/Default Generic Workspace"
        });
        let group = GroupRecord::from_raw(&raw, &keys()).unwrap();

        assert_eq!(group.environment_name, "jupyter_default");
        assert_eq!(group.start_date, "1900-01-01");
        assert_eq!(group.end_date, "1900-01-01");
        assert_eq!(group.description, "No description provided");
    }

    #[test]
    fn test_empty_or_non_string_attribute_falls_back() {
        let raw = json!({
            "id": "g1",
            "path": "/jupyter-workspaces/W",
            "attributes": {
                "workspace.xlscsde.nhs.uk/environment": [],
                "workspace.xlscsde.nhs.uk/endDate": [20300101]
            }
        });
        let group = GroupRecord::from_raw(&raw, &keys()).unwrap();

        assert_eq!(group.environment_name, "jupyter_default");
        assert_eq!(group.end_date, "1900-01-01");
    }

    #[test]
    fn test_custom_namespace() {
        let raw = json!({
            "id": "g1",
            "path": "/ws/W",
            "attributes": {
                "example.org/environment": ["gpu"],
                "workspace.xlscsde.nhs.uk/environment": ["ignored"]
            }
        });
        let group = GroupRecord::from_raw(&raw, &AttributeKeys::for_namespace("example.org")).unwrap();
        assert_eq!(group.environment_name, "gpu");
    }

    #[test]
    fn test_missing_required_fields() {
        let cases = [
            (json!({"path": "/jupyter-workspaces/W"}), "id not present"),
            (json!({"id": "", "path": "/jupyter-workspaces/W"}), "id not present"),
            (json!({"id": "g1"}), "path not present"),
            (json!({"id": "g1", "path": ""}), "path not present"),
            (json!({"id": "g1", "path": "/jupyter-workspaces/"}), "display_name not present"),
        ];

        for (raw, expected) in cases {
            let err = GroupRecord::from_raw(&raw, &keys()).unwrap_err();
            assert_eq!(err.reason, expected, "payload: {raw}");
            assert_eq!(err.raw, raw);
        }
    }

    #[test]
    fn test_days_until_expiry_sign() {
        let group = GroupRecord::from_raw(&colorectal(), &keys()).unwrap();

        assert_eq!(group.days_until_expiry_from(date!(2029 - 12 - 31)).unwrap(), 1);
        assert_eq!(group.days_until_expiry_from(date!(2030 - 01 - 01)).unwrap(), 0);
        assert_eq!(group.days_until_expiry_from(date!(2030 - 01 - 11)).unwrap(), -10);
        assert!(group.days_until_expiry_from(date!(2025 - 06 - 01)).unwrap() > 0);
    }

    #[test]
    fn test_malformed_end_date() {
        let raw = json!({
            "id": "g1",
            "path": "/jupyter-workspaces/W",
            "attributes": {"workspace.xlscsde.nhs.uk/endDate": ["01/01/2030"]}
        });
        let group = GroupRecord::from_raw(&raw, &keys()).unwrap();

        match group.days_until_expiry() {
            Err(DomainError::InvalidDate { value, .. }) => assert_eq!(value, "01/01/2030"),
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_copies_override_and_sets_labels() {
        let group = GroupRecord::from_raw(&colorectal(), &keys()).unwrap();
        let base = json!({
            "image": "jupyter/advanced:1.0",
            "extra_labels": {"team": "overwritten"}
        });

        let descriptor = group
            .to_workspace_descriptor_at(&base, date!(2029 - 12 - 02))
            .unwrap();

        assert_eq!(descriptor.slug, "colorectal-cancer-research-group-workspace");
        assert_eq!(descriptor.ws_days_left, 30);
        assert_eq!(descriptor.kubespawner_override["image"], "jupyter/advanced:1.0");
        assert_eq!(
            descriptor.kubespawner_override["extra_labels"],
            json!({"workspace": "colorectal-cancer-research-group-workspace"})
        );
        // caller's base configuration is untouched
        assert_eq!(base["extra_labels"], json!({"team": "overwritten"}));
    }

    #[test]
    fn test_descriptor_with_empty_override() {
        let group = GroupRecord::from_raw(&colorectal(), &keys()).unwrap();
        let descriptor = group.to_workspace_descriptor(&empty_override()).unwrap();

        assert_eq!(
            descriptor.kubespawner_override,
            json!({"extra_labels": {"workspace": "colorectal-cancer-research-group-workspace"}})
        );
    }

    #[test]
    #[traced_test]
    fn test_non_object_override_is_logged_and_dropped() {
        let group = GroupRecord::from_raw(&colorectal(), &keys()).unwrap();
        let descriptor = group.to_workspace_descriptor(&json!("img")).unwrap();

        assert_eq!(
            descriptor.kubespawner_override,
            json!({"extra_labels": {"workspace": "colorectal-cancer-research-group-workspace"}})
        );
        assert!(logs_contain("spawner override is not an object"));
    }
}

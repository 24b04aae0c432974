//! Keycloak fixtures and a mock directory for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use httpmock::prelude::*;
use resolver_http::HttpClient;
use secrecy::SecretString;
use serde_json::{Value, json};
use workspace_resolver::domain::HttpDirectoryClient;
use workspace_resolver::{Service, WorkspaceResolverConfig};

pub const REALM_PATH: &str = "/admin/realms/xlscsde";
pub const PARENT_ID: &str = "429c803a-a033-4e1e-8aea-73b92fd43003";
pub const COLORECTAL_ID: &str = "79cdf13c-a6bc-46cd-8a5d-1281b0fe8e53";
pub const DEFAULT_ID: &str = "a6fdb60b-f11d-4c59-bdf3-e03fac24b6ab";
pub const TOKEN: &str = "eyJhbGciOiJSUzI1NiJ9.test";

fn access() -> Value {
    json!({
        "view": true,
        "viewMembers": true,
        "manageMembers": false,
        "manage": false,
        "manageMembership": false
    })
}

pub fn groups_listing() -> Value {
    json!([
        {
            "id": PARENT_ID,
            "name": "jupyter-workspaces",
            "path": "/jupyter-workspaces",
            "subGroupCount": 2,
            "access": access()
        },
        {
            "id": "0239d876-a497-476d-96c8-96bde8d9f718",
            "name": "some-other-group",
            "path": "/some-other-group",
            "subGroupCount": 0,
            "access": access()
        }
    ])
}

pub fn default_generic_group() -> Value {
    json!({
        "id": DEFAULT_ID,
        "name": "Default Generic Workspace",
        "path": "/jupyter-workspaces/Default Generic Workspace",
        "parentId": PARENT_ID,
        "subGroupCount": 0,
        "attributes": {
            "workspace.xlscsde.nhs.uk/startDate": ["2022-01-01"],
            "workspace.xlscsde.nhs.uk/environment": ["jupyter_default"],
            "workspace.xlscsde.nhs.uk/endDate": ["2030-01-01"],
            "workspace.xlscsde.nhs.uk/description": ["Basic environment for testing with Python R and Julia."]
        },
        "access": access()
    })
}

pub fn parent_children() -> Value {
    json!([
        {
            "id": COLORECTAL_ID,
            "name": "Colorectal Cancer Research Group Workspace",
            "path": "/jupyter-workspaces/Colorectal Cancer Research Group Workspace",
            "parentId": PARENT_ID,
            "subGroupCount": 0,
            "attributes": {
                "workspace.xlscsde.nhs.uk/environment": ["jupyter_advanced"],
                "workspace.xlscsde.nhs.uk/startDate": ["2022-01-01"],
                "workspace.xlscsde.nhs.uk/endDate": ["2030-01-01"],
                "workspace.xlscsde.nhs.uk/description": ["An example workspace for the testing of using keycloak groups"]
            },
            "access": access()
        },
        default_generic_group()
    ])
}

/// Mock Keycloak realm answering the three group endpoints.
pub struct MockKeycloak {
    pub server: MockServer,
}

impl MockKeycloak {
    pub fn start() -> Self {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path(format!("{REALM_PATH}/groups"))
                .query_param("populateHierarchy", "true")
                .header("authorization", format!("Bearer {TOKEN}"));
            then.status(200).json_body(groups_listing());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path(format!("{REALM_PATH}/groups/{PARENT_ID}/children"))
                .header("authorization", format!("Bearer {TOKEN}"));
            then.status(200).json_body(parent_children());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path(format!("{REALM_PATH}/groups/{DEFAULT_ID}"))
                .header("authorization", format!("Bearer {TOKEN}"));
            then.status(200).json_body(default_generic_group());
        });

        Self { server }
    }

    pub fn base_url(&self) -> String {
        self.server.url(REALM_PATH)
    }

    pub fn directory(&self) -> HttpDirectoryClient {
        directory_for(&self.base_url())
    }
}

pub fn directory_for(base_url: &str) -> HttpDirectoryClient {
    let http = HttpClient::builder()
        .allow_insecure_http()
        .build()
        .expect("http client");
    HttpDirectoryClient::new(http, base_url, SecretString::from(TOKEN.to_owned()))
}

pub fn environments_config() -> WorkspaceResolverConfig {
    let mut config = WorkspaceResolverConfig::default();
    config.environments.insert(
        "jupyter_advanced".to_owned(),
        json!({"image": "jupyter/datascience-notebook:latest"}),
    );
    config.environments.insert(
        "jupyter_default".to_owned(),
        json!({"image": "jupyter/datascience-notebook:latest"}),
    );
    config
}

pub fn service(keycloak: &MockKeycloak) -> Arc<Service> {
    Arc::new(Service::new(
        Arc::new(keycloak.directory()),
        &environments_config(),
    ))
}

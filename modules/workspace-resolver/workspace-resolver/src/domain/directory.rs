//! Read-only access to the identity provider's group API.

use std::time::Duration;

use async_trait::async_trait;
use resolver_http::{HttpClient, HttpError, TlsRootConfig, TransportSecurity};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

use crate::config::DirectoryConfig;

/// The only status the directory is expected to answer with.
pub const EXPECTED_STATUS: u16 = 200;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("expected directory response of {expected} but received {received}")]
    UnexpectedResponseStatus { received: u16, expected: u16 },

    #[error("directory returned a body that is not JSON: {0}")]
    Parse(#[source] HttpError),

    #[error("directory response for {path} is not a JSON {expected}")]
    UnexpectedBody { path: String, expected: &'static str },

    #[error("directory request failed: {0}")]
    Transport(#[source] HttpError),
}

impl From<HttpError> for DirectoryError {
    fn from(e: HttpError) -> Self {
        match e {
            err @ HttpError::Json(_) => Self::Parse(err),
            other => Self::Transport(other),
        }
    }
}

/// Authenticated read-only queries against the group API.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// `GET <base_url><path>`; returns the parsed JSON body of a 200 response.
    ///
    /// # Errors
    ///
    /// - `UnexpectedResponseStatus` for any status other than 200
    /// - `Parse` if the body is not JSON
    /// - `Transport` for connection, TLS or timeout failures
    async fn query(&self, path: &str) -> Result<Value, DirectoryError>;
}

/// [`DirectoryClient`] over HTTPS with a bearer token.
pub struct HttpDirectoryClient {
    http: HttpClient,
    base_url: String,
    access_token: SecretString,
}

impl HttpDirectoryClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token,
        }
    }

    /// Build the client described by `config`.
    ///
    /// With a CA bundle configured only its roots are trusted; otherwise the
    /// bundled Mozilla roots are.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Transport` if the CA bundle cannot be loaded.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let transport = if config.allow_insecure_http {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        };

        let tls_roots = config
            .ca_bundle
            .clone()
            .map_or(TlsRootConfig::WebPki, TlsRootConfig::CaBundle);

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tls_roots(tls_roots)
            .transport(transport)
            .build()?;

        Ok(Self::new(
            http,
            config.base_url.clone(),
            config.access_token.clone(),
        ))
    }
}

impl std::fmt::Debug for HttpDirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectoryClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn query(&self, path: &str) -> Result<Value, DirectoryError> {
        tracing::debug!(path, "directory request");

        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != EXPECTED_STATUS {
            tracing::warn!(path, status, "unexpected directory response status");
            return Err(DirectoryError::UnexpectedResponseStatus {
                received: status,
                expected: EXPECTED_STATUS,
            });
        }

        Ok(response.json().await?)
    }
}

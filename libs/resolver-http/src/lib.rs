#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! HTTP client used by the workspace resolver to talk to the identity provider.
//!
//! A small hyper-based client with:
//! - TLS via rustls, HTTPS only by default
//! - Trust stores: Mozilla roots or a PEM CA bundle file
//! - Per-request timeout
//! - Response body size limits
//! - Transparent response decompression (gzip, brotli, deflate)
//!
//! There is no retry layer: a failed request is reported to the caller as is.
//!
//! # Example
//!
//! ```ignore
//! use resolver_http::{DEFAULT_CA_BUNDLE, HttpClient, TlsRootConfig};
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .tls_roots(TlsRootConfig::CaBundle(DEFAULT_CA_BUNDLE.into()))
//!     .build()?;
//!
//! let resp = client
//!     .get("https://keycloak.example.com/admin/realms/demo/groups")
//!     .bearer_auth(token)
//!     .send()
//!     .await?;
//! let groups: serde_json::Value = resp.json().await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_CA_BUNDLE, DEFAULT_USER_AGENT, TlsRootConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};

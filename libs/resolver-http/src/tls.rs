//! Trust store loading for the HTTP client.
//!
//! CA bundles are read from disk every time a client is built, so a rotated
//! bundle is picked up by the next client.

use crate::error::HttpError;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;
use std::path::Path;
use std::sync::Arc;

/// Crypto provider for TLS connections.
///
/// Uses the process-wide default when one is installed, otherwise a fresh
/// aws-lc-rs provider (without installing it globally).
pub fn get_crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Read every certificate from a PEM bundle.
///
/// # Errors
///
/// Returns `HttpError::CaBundle` if the file cannot be opened or a PEM
/// section is malformed.
pub fn read_ca_bundle(path: &Path) -> Result<Vec<CertificateDer<'static>>, HttpError> {
    let bundle_error = |reason: String| HttpError::CaBundle {
        path: path.to_path_buf(),
        reason,
    };

    CertificateDer::pem_file_iter(path)
        .map_err(|e| bundle_error(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| bundle_error(e.to_string()))
}

fn client_config_from_roots(
    certs: impl IntoIterator<Item = CertificateDer<'static>>,
    origin: &str,
) -> Result<rustls::ClientConfig, String> {
    let mut root_store = rustls::RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(certs);

    if ignored > 0 {
        tracing::warn!(
            origin,
            added,
            ignored,
            "some root certificates could not be parsed"
        );
    }

    if added == 0 {
        return Err(format!("no valid root CA certificates in {origin}"));
    }

    let config = rustls::ClientConfig::builder_with_provider(get_crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| format!("failed to set TLS protocol versions: {e}"))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(config)
}

/// Build a rustls `ClientConfig` trusting only the certificates of a PEM bundle.
///
/// # Errors
///
/// Returns `HttpError::CaBundle` if the bundle cannot be read or holds no
/// usable certificate.
pub fn ca_bundle_client_config(path: &Path) -> Result<rustls::ClientConfig, HttpError> {
    let certs = read_ca_bundle(path)?;
    tracing::debug!(path = %path.display(), count = certs.len(), "loaded CA bundle");

    client_config_from_roots(certs, "CA bundle").map_err(|reason| HttpError::CaBundle {
        path: path.to_path_buf(),
        reason,
    })
}

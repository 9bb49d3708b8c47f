//! TLS trust configuration.
//!
//! A [`TrustConfig`] decides which server certificates the transport accepts:
//! either any certificate (verification skipped) or only certificates that
//! chain to the roots parsed from a PEM bundle.

use std::fmt;
use std::path::Path;

use reqwest::{Certificate, ClientBuilder};
use tracing::{debug, instrument, warn};

use crate::error::TransferError;

/// Validated TLS trust rules shared by every transport of a client.
///
/// When verification is not skipped, the configuration always holds at least
/// one trusted root; [`build_trust`] refuses to produce anything else.
#[derive(Clone)]
pub struct TrustConfig {
    skip_verification: bool,
    trusted_roots: Vec<Certificate>,
}

impl TrustConfig {
    /// Trust configuration that accepts any server certificate.
    #[must_use]
    pub fn insecure() -> Self {
        Self {
            skip_verification: true,
            trusted_roots: Vec::new(),
        }
    }

    /// Returns true when server certificates are not verified.
    #[must_use]
    pub fn skips_verification(&self) -> bool {
        self.skip_verification
    }

    /// Number of trusted roots parsed from the bundle.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.trusted_roots.len()
    }

    /// Applies these trust rules to a transport builder.
    ///
    /// Verified mode trusts the bundle roots only; the platform store is
    /// disabled so a bundle fully defines what is accepted.
    pub(crate) fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        if self.skip_verification {
            return builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        builder.tls_certs_only(self.trusted_roots.iter().cloned())
    }
}

impl fmt::Debug for TrustConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustConfig")
            .field("skip_verification", &self.skip_verification)
            .field("trusted_roots", &self.trusted_roots.len())
            .finish()
    }
}

/// Builds a trust configuration from an "insecure" flag and a bundle path.
///
/// With `skip_verification` set the bundle path is ignored. Otherwise the
/// bundle is read and must contain at least one PEM certificate.
///
/// # Errors
///
/// - [`TransferError::CertificateNotFound`] if the bundle cannot be read
/// - [`TransferError::CertificateParse`] if it holds no valid certificate
#[instrument(level = "debug", skip(cert_bundle_path), fields(path = %cert_bundle_path.as_ref().display()))]
pub fn build_trust(
    skip_verification: bool,
    cert_bundle_path: impl AsRef<Path>,
) -> Result<TrustConfig, TransferError> {
    if skip_verification {
        warn!("TLS certificate verification disabled");
        return Ok(TrustConfig::insecure());
    }

    let path = cert_bundle_path.as_ref();
    let pem = std::fs::read(path).map_err(|e| TransferError::certificate_not_found(path, e))?;

    let trusted_roots = Certificate::from_pem_bundle(&pem)
        .map_err(|e| TransferError::certificate_parse(path, e.to_string()))?;
    if trusted_roots.is_empty() {
        return Err(TransferError::certificate_parse(
            path,
            "no PEM certificate found in bundle",
        ));
    }

    debug!(roots = trusted_roots.len(), "loaded trusted roots");
    Ok(TrustConfig {
        skip_verification: false,
        trusted_roots,
    })
}

//! Error types for the transfer client.
//!
//! Every fallible operation in the crate returns [`TransferError`]. Variants
//! carry the URL or path they concern so a caller can report the failure
//! without threading extra context through.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a client, sending a request or
/// downloading a file.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The URL contains a control character or is not an absolute http(s) URL.
    ///
    /// Raised before any network I/O is attempted.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A download was requested with an empty remote URL.
    #[error("url is empty")]
    EmptyUrl,

    /// The certificate bundle could not be read.
    #[error("cannot read certificate bundle {path}: {source}")]
    CertificateNotFound {
        /// The bundle path that was supplied.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The certificate bundle yielded no usable PEM certificate.
    #[error("append certs from pem failed for {path}: {reason}")]
    CertificateParse {
        /// The bundle path that was supplied.
        path: PathBuf,
        /// Parser detail.
        reason: String,
    },

    /// The underlying HTTP transport could not be constructed.
    #[error("failed to build HTTP transport: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A header or cookie cannot be represented on the wire.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// Header or cookie name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Network-level failure: DNS, connection refused, TLS handshake, timeout.
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// The URL being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A download received a non-success status; nothing was written.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL being downloaded.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Writing the downloaded body to disk failed.
    #[error("IO error writing to {path}: {source}")]
    LocalWrite {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a certificate-bundle-unreadable error.
    pub fn certificate_not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CertificateNotFound {
            path: path.into(),
            source,
        }
    }

    /// Creates a certificate parse error.
    pub fn certificate_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CertificateParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a transport error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a local write error.
    pub fn local_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalWrite {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the failure was a transport timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path that the source error does not carry.

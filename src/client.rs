//! Verb-level request operations.
//!
//! `TransferClient` wraps a shared [`ClientConfig`] and exposes one method per
//! verb and body variant. Every method validates its URL before any I/O and
//! hands the raw response back; status codes are never turned into errors.

use std::path::Path;

use reqwest::{Method, Response};
use tracing::{debug, instrument};

use crate::config::ClientOptions;
use crate::download::{self, DownloadOutcome};
use crate::error::TransferError;
use crate::request::{Cookie, FilePart, RequestBody, RequestSpec};
use crate::tls::build_trust;
use crate::transport::{ClientConfig, ProtocolPreference, build_client_with_options};

/// HTTP transfer client.
///
/// Create one per process or session and share it: cloning is cheap and all
/// clones use the same connection pools. Every operation is a single awaited
/// call with no background work.
///
/// # Example
///
/// ```no_run
/// use transfer_core::TransferClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TransferClient::new(false, "/etc/ssl/certs/ca-certificates.crt", false)?;
/// let response = client.get("https://example.com/").await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TransferClient {
    config: ClientConfig,
}

impl TransferClient {
    /// Creates a client from the trust flag, a certificate bundle path and
    /// the alternate-protocol flag, with default options.
    ///
    /// # Errors
    ///
    /// Returns the trust builder's error or [`TransferError::ClientBuild`].
    pub fn new(
        insecure_skip_verify: bool,
        cert_bundle_path: impl AsRef<Path>,
        use_alternate_protocol: bool,
    ) -> Result<Self, TransferError> {
        Self::with_options(
            insecure_skip_verify,
            cert_bundle_path,
            use_alternate_protocol.into(),
            &ClientOptions::default(),
        )
    }

    /// Creates a client with explicit [`ClientOptions`].
    ///
    /// # Errors
    ///
    /// Returns the trust builder's error or [`TransferError::ClientBuild`].
    pub fn with_options(
        insecure_skip_verify: bool,
        cert_bundle_path: impl AsRef<Path>,
        preference: ProtocolPreference,
        options: &ClientOptions,
    ) -> Result<Self, TransferError> {
        let trust = build_trust(insecure_skip_verify, cert_bundle_path)?;
        let config = build_client_with_options(trust, preference, options)?;
        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends an arbitrary request through the redirect-following handle.
    ///
    /// # Errors
    ///
    /// See [`DispatchHandle::send`](crate::transport::DispatchHandle::send).
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Response, TransferError> {
        let response = self.config.following().send(spec).await?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// Sends an arbitrary request through the non-following handle.
    ///
    /// # Errors
    ///
    /// See [`DispatchHandle::send`](crate::transport::DispatchHandle::send).
    pub async fn execute_without_redirect(
        &self,
        spec: &RequestSpec,
    ) -> Result<Response, TransferError> {
        let response = self.config.no_redirect().send(spec).await?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// GET `url`.
    ///
    /// # Errors
    ///
    /// [`TransferError::InvalidUrl`] before I/O, [`TransferError::Transport`]
    /// on network failure.
    #[instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response, TransferError> {
        self.execute(&RequestSpec::new(Method::GET, url)?).await
    }

    /// GET `url` with extra headers and cookies. Both are transmitted even
    /// when a header and a cookie share a name.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`TransferError::InvalidHeader`].
    #[instrument(skip(self, headers, cookies))]
    pub async fn get_with_cookies(
        &self,
        url: &str,
        headers: &[(String, String)],
        cookies: &[Cookie],
    ) -> Result<Response, TransferError> {
        let spec = RequestSpec::new(Method::GET, url)?
            .headers(headers.to_vec())
            .cookies(cookies.to_vec());
        self.execute(&spec).await
    }

    /// POST `data` as an urlencoded form.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    #[instrument(skip(self, data))]
    pub async fn post_form(
        &self,
        url: &str,
        data: &[(String, String)],
    ) -> Result<Response, TransferError> {
        self.post_form_with_cookies(url, data, &[]).await
    }

    /// POST `data` as an urlencoded form with cookies.
    ///
    /// # Errors
    ///
    /// As [`get_with_cookies`](Self::get_with_cookies).
    #[instrument(skip(self, data, cookies))]
    pub async fn post_form_with_cookies(
        &self,
        url: &str,
        data: &[(String, String)],
        cookies: &[Cookie],
    ) -> Result<Response, TransferError> {
        let spec = RequestSpec::new(Method::POST, url)?
            .cookies(cookies.to_vec())
            .body(RequestBody::Form(data.to_vec()));
        self.execute(&spec).await
    }

    /// POST a multipart body: the `data` fields plus one file part named
    /// `field_name` with filename `file_name` holding `chunk`.
    ///
    /// An empty `chunk` adds no file part.
    ///
    /// # Errors
    ///
    /// As [`get_with_cookies`](Self::get_with_cookies).
    #[instrument(skip(self, data, chunk, cookies), fields(chunk_len = chunk.len()))]
    pub async fn post_file_chunk_with_cookies(
        &self,
        url: &str,
        field_name: &str,
        file_name: &str,
        data: &[(String, String)],
        chunk: &[u8],
        cookies: &[Cookie],
    ) -> Result<Response, TransferError> {
        let file = FilePart::new(field_name, file_name, chunk);
        let spec = RequestSpec::new(Method::POST, url)?
            .cookies(cookies.to_vec())
            .body(RequestBody::multipart(data.to_vec(), Some(file)));
        self.execute(&spec).await
    }

    /// POST `data` as an urlencoded form without following redirects; a 3xx
    /// comes back as is, `Location` included.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    #[instrument(skip(self, data))]
    pub async fn post_form_without_redirect(
        &self,
        url: &str,
        data: &[(String, String)],
    ) -> Result<Response, TransferError> {
        let spec = RequestSpec::new(Method::POST, url)?.body(RequestBody::Form(data.to_vec()));
        self.execute_without_redirect(&spec).await
    }

    /// POST raw bytes verbatim.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    #[instrument(skip(self, data))]
    pub async fn post_data(&self, url: &str, data: &[u8]) -> Result<Response, TransferError> {
        self.send_raw(Method::POST, url, data).await
    }

    /// PUT raw bytes verbatim.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    #[instrument(skip(self, data))]
    pub async fn put(&self, url: &str, data: &[u8]) -> Result<Response, TransferError> {
        self.send_raw(Method::PUT, url, data).await
    }

    /// DELETE with raw bytes as the body.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    #[instrument(skip(self, data))]
    pub async fn delete(&self, url: &str, data: &[u8]) -> Result<Response, TransferError> {
        self.send_raw(Method::DELETE, url, data).await
    }

    async fn send_raw(
        &self,
        method: Method,
        url: &str,
        data: &[u8],
    ) -> Result<Response, TransferError> {
        let spec = RequestSpec::new(method, url)?.body(RequestBody::Raw(data.to_vec()));
        self.execute(&spec).await
    }

    /// Downloads `remote_url` to `local_path` unless the file already exists
    /// and `force` is false.
    ///
    /// # Errors
    ///
    /// See [`download::download`].
    pub async fn download(
        &self,
        local_path: impl AsRef<Path>,
        remote_url: &str,
        force: bool,
    ) -> Result<DownloadOutcome, TransferError> {
        download::download(&self.config, local_path.as_ref(), remote_url, force).await
    }
}

//! Transport selection and the two dispatch handles.
//!
//! A [`ClientConfig`] owns an ordered transport chain: the alternate
//! (HTTP/3) transport when requested and compiled in, then the standard
//! (HTTP/1.1 or HTTP/2) transport. Each transport carries one client that
//! follows redirects and one that returns the first redirect response as is.
//!
//! When the alternate transport fails for a host, the request is re-sent on
//! the standard transport and the host is remembered so later requests go
//! straight to the standard transport.

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientOptions;
use crate::error::TransferError;
use crate::request::RequestSpec;
use crate::tls::TrustConfig;

/// Which protocol family the client should try first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolPreference {
    /// Standard transport; HTTP/1.1 or HTTP/2 as negotiated.
    #[default]
    Auto,
    /// Alternate UDP transport first, standard transport as per-host fallback.
    Http3,
}

impl From<bool> for ProtocolPreference {
    fn from(use_alternate_protocol: bool) -> Self {
        if use_alternate_protocol {
            Self::Http3
        } else {
            Self::Auto
        }
    }
}

/// Redirect behavior of a dispatch handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Follow redirects up to the configured hop count.
    Follow,
    /// Return the first redirect response unmodified.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportKind {
    Alternate,
    Standard,
}

#[derive(Debug)]
struct Transport {
    kind: TransportKind,
    following: Client,
    manual: Client,
}

impl Transport {
    fn build(
        kind: TransportKind,
        trust: &TrustConfig,
        options: &ClientOptions,
    ) -> Result<Self, TransferError> {
        let following = base_builder(kind, trust, options)
            .redirect(Policy::limited(options.max_redirects))
            .build()
            .map_err(|source| TransferError::ClientBuild { source })?;
        let manual = base_builder(kind, trust, options)
            .redirect(Policy::none())
            .build()
            .map_err(|source| TransferError::ClientBuild { source })?;
        Ok(Self {
            kind,
            following,
            manual,
        })
    }

    fn client(&self, mode: RedirectMode) -> &Client {
        match mode {
            RedirectMode::Follow => &self.following,
            RedirectMode::Manual => &self.manual,
        }
    }
}

fn base_builder(
    kind: TransportKind,
    trust: &TrustConfig,
    options: &ClientOptions,
) -> ClientBuilder {
    let builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .gzip(true)
        .user_agent(options.user_agent.clone());
    let builder = trust.apply(builder);
    match kind {
        TransportKind::Standard => builder,
        TransportKind::Alternate => alternate_builder(builder),
    }
}

#[cfg(feature = "http3")]
fn alternate_builder(builder: ClientBuilder) -> ClientBuilder {
    builder.http3_prior_knowledge()
}

#[cfg(not(feature = "http3"))]
fn alternate_builder(builder: ClientBuilder) -> ClientBuilder {
    builder
}

/// Ordered transports plus the hosts where the alternate one failed.
struct TransportChain {
    alternate: Option<Transport>,
    standard: Transport,
    fallback_hosts: DashSet<String>,
}

impl TransportChain {
    async fn send(
        &self,
        spec: &RequestSpec,
        mode: RedirectMode,
    ) -> Result<Response, TransferError> {
        if let Some(alternate) = &self.alternate {
            let host = host_key(&spec.url);
            if self.fallback_hosts.contains(&host) {
                debug!(host = %host, "host marked for standard transport");
            } else {
                match spec.build(alternate.client(mode))?.send().await {
                    Ok(response) => return Ok(response),
                    // Fall back only when nothing reached the server.
                    Err(error) if !error.is_connect() => {
                        return Err(TransferError::transport(spec.url.as_str(), error));
                    }
                    Err(error) => {
                        warn!(
                            host = %host,
                            error = %error,
                            "alternate transport failed, falling back to standard transport"
                        );
                        self.fallback_hosts.insert(host);
                    }
                }
            }
        }

        spec.build(self.standard.client(mode))?
            .send()
            .await
            .map_err(|e| TransferError::transport(spec.url.as_str(), e))
    }
}

/// `host:port` key for per-host fallback memory.
fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

/// Immutable, shareable client configuration.
///
/// Cloning is cheap; clones share the same transports and connection pools.
/// Safe to use from many tasks at once.
#[derive(Clone)]
pub struct ClientConfig {
    trust: TrustConfig,
    preference: ProtocolPreference,
    chain: Arc<TransportChain>,
}

impl ClientConfig {
    /// The trust rules every transport was built with.
    #[must_use]
    pub fn trust(&self) -> &TrustConfig {
        &self.trust
    }

    /// The requested protocol preference.
    #[must_use]
    pub fn preference(&self) -> ProtocolPreference {
        self.preference
    }

    /// Returns true when an alternate transport is part of the chain.
    #[must_use]
    pub fn has_alternate_transport(&self) -> bool {
        self.chain.alternate.is_some()
    }

    /// Returns true when `url`'s host has fallen back to the standard transport.
    #[must_use]
    pub fn is_host_on_fallback(&self, url: &Url) -> bool {
        self.chain.fallback_hosts.contains(&host_key(url))
    }

    /// Dispatch handle that follows redirects.
    #[must_use]
    pub fn following(&self) -> DispatchHandle<'_> {
        DispatchHandle {
            config: self,
            mode: RedirectMode::Follow,
        }
    }

    /// Dispatch handle that never follows redirects.
    #[must_use]
    pub fn no_redirect(&self) -> DispatchHandle<'_> {
        DispatchHandle {
            config: self,
            mode: RedirectMode::Manual,
        }
    }

    #[cfg(test)]
    fn with_alternate_client(mut self, client: Client) -> Self {
        let chain = TransportChain {
            alternate: Some(Transport {
                kind: TransportKind::Alternate,
                following: client.clone(),
                manual: client,
            }),
            standard: Transport {
                kind: TransportKind::Standard,
                following: self.chain.standard.following.clone(),
                manual: self.chain.standard.manual.clone(),
            },
            fallback_hosts: DashSet::new(),
        };
        self.chain = Arc::new(chain);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<TransportKind> = self
            .chain
            .alternate
            .iter()
            .chain(std::iter::once(&self.chain.standard))
            .map(|t| t.kind)
            .collect();
        f.debug_struct("ClientConfig")
            .field("trust", &self.trust)
            .field("preference", &self.preference)
            .field("transports", &kinds)
            .finish_non_exhaustive()
    }
}

/// A request-sending entry point bound to one redirect mode.
#[derive(Debug, Clone, Copy)]
pub struct DispatchHandle<'a> {
    config: &'a ClientConfig,
    mode: RedirectMode,
}

impl DispatchHandle<'_> {
    #[must_use]
    pub fn mode(&self) -> RedirectMode {
        self.mode
    }

    /// Sends `spec` through the transport chain.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidHeader`] if the request cannot be encoded
    /// - [`TransferError::Transport`] for network, TLS or timeout failures
    pub async fn send(&self, spec: &RequestSpec) -> Result<Response, TransferError> {
        self.config.chain.send(spec, self.mode).await
    }
}

/// Builds a client configuration with default [`ClientOptions`].
///
/// # Errors
///
/// Returns [`TransferError::ClientBuild`] if a transport cannot be built.
pub fn build_client(
    trust: TrustConfig,
    use_alternate_protocol: bool,
) -> Result<ClientConfig, TransferError> {
    build_client_with_options(trust, use_alternate_protocol.into(), &ClientOptions::default())
}

/// Builds a client configuration.
///
/// # Errors
///
/// Returns [`TransferError::ClientBuild`] if a transport cannot be built.
#[instrument(level = "debug", skip(trust, options))]
pub fn build_client_with_options(
    trust: TrustConfig,
    preference: ProtocolPreference,
    options: &ClientOptions,
) -> Result<ClientConfig, TransferError> {
    let alternate = match preference {
        ProtocolPreference::Auto => None,
        ProtocolPreference::Http3 if cfg!(feature = "http3") => {
            Some(Transport::build(TransportKind::Alternate, &trust, options)?)
        }
        ProtocolPreference::Http3 => {
            warn!("HTTP/3 requested but not compiled in (enable the `http3` feature); using standard transport");
            None
        }
    };
    let standard = Transport::build(TransportKind::Standard, &trust, options)?;

    Ok(ClientConfig {
        trust,
        preference,
        chain: Arc::new(TransportChain {
            alternate,
            standard,
            fallback_hosts: DashSet::new(),
        }),
    })
}

//! Transfer Core Library
//!
//! An HTTP transfer client: TLS trust configuration, optional HTTP/3 with
//! per-host fallback, cookie propagation, multipart chunked upload, redirect
//! suppression and idempotent file download.
//!
//! # Architecture
//!
//! - [`tls`] - Trust configuration from an insecure flag or a PEM bundle
//! - [`transport`] - Transport chain and the two dispatch handles
//! - [`request`] - URL validation, headers, cookies, body variants
//! - [`client`] - Verb-level operations returning raw responses
//! - [`download`] - Existence-checked download to a local file
//! - [`config`] - Client options and the TOML config file
//!
//! Responses are [`reqwest::Response`] values: status, headers and a body
//! stream. Dropping one releases its connection back to the pool.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
mod constants;
pub mod download;
mod error;
pub mod request;
pub mod tls;
pub mod transport;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use client::TransferClient;
pub use config::{ClientOptions, ConfigError, FileConfig, default_config_path};
pub use constants::{CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, REQUEST_TIMEOUT_SECS};
pub use download::DownloadOutcome;
pub use error::TransferError;
pub use request::{Cookie, FilePart, FormValues, Headers, RequestBody, RequestSpec, validate_url};
pub use reqwest::{Method, Response, StatusCode};
pub use tls::{TrustConfig, build_trust};
pub use transport::{
    ClientConfig, DispatchHandle, ProtocolPreference, RedirectMode, build_client,
    build_client_with_options,
};

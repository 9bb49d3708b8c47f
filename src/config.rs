//! Client options and the optional TOML config file.
//!
//! [`ClientOptions`] tunes the transport (timeouts, redirect hops, user agent).
//! [`FileConfig`] is what `config.toml` may contain; command-line values win
//! over file values, which win over built-in defaults.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, REQUEST_TIMEOUT_SECS};
use crate::transport::ProtocolPreference;
use crate::user_agent;

/// Transport tuning shared by both dispatch handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
    /// Bound on a whole exchange, body included.
    pub request_timeout: Duration,
    /// Hops followed by the following handle before giving up.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// Errors loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// insecure_skip_verify = false
/// ca_bundle = "/etc/ssl/certs/ca-certificates.crt"
/// protocol = "http3"
/// connect_timeout_secs = 10
/// request_timeout_secs = 120
/// max_redirects = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub insecure_skip_verify: Option<bool>,
    pub ca_bundle: Option<PathBuf>,
    pub protocol: Option<ProtocolPreference>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_redirects: Option<usize>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the default config file if it exists; a missing file (or no
    /// resolvable config directory) yields empty defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is unreadable or invalid.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Applies file values over built-in option defaults.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        if let Some(secs) = self.connect_timeout_secs {
            options.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            options.request_timeout = Duration::from_secs(secs);
        }
        if let Some(hops) = self.max_redirects {
            options.max_redirects = hops;
        }
        if let Some(ua) = &self.user_agent {
            options.user_agent.clone_from(ua);
        }
        options
    }
}

/// `$XDG_CONFIG_HOME/transfer/config.toml`, else `~/.config/transfer/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
    )
    .map(|dir| dir.join("config.toml"))
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}

fn resolve_config_dir(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        return Some(xdg.join("transfer"));
    }
    home.map(|home| home.join(".config").join("transfer"))
}

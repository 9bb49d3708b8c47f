//! Constants for the transfer client (timeouts, redirects).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (5 minutes, large downloads included).
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Redirect hops followed by the following dispatch handle.
pub const MAX_REDIRECTS: usize = 10;

/// MIME type for urlencoded form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

//! Default User-Agent for transfer requests.

/// Default User-Agent sent on every request (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    format!("transfer/{}", env!("CARGO_PKG_VERSION"))
}

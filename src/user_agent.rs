//! Default User-Agent string for download HTTP clients.
//!
//! Single source for the UA format so every request identifies the tool and
//! its version consistently (good citizenship; RFC 9308). The string can be
//! overridden per run through configuration.

/// Default User-Agent for download requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("batchfetch/{version}")
}

//! Log-safe rendering of credentials.
//!
//! Bearer and refresh tokens pass through tracing fields on every refresh cycle;
//! these helpers make sure only a short prefix ever reaches the log output.

use std::fmt;

/// Number of leading characters kept visible when a token is rendered
const VISIBLE_PREFIX: usize = 6;

/// Masked token representation
///
/// Shows the first few characters followed by `***`, so log lines can still be
/// correlated across a refresh without leaking the credential.
///
/// # Example
/// ```
/// use yt_console::logging::MaskedToken;
///
/// let token = "eyJhbGciOiJIUzI1NiJ9.payload.signature";
/// assert_eq!(MaskedToken::new(token).to_string(), "eyJhbG***");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MaskedToken<'a> {
    inner: &'a str,
}

impl<'a> MaskedToken<'a> {
    pub fn new(token: &'a str) -> Self {
        Self { inner: token }
    }
}

impl fmt::Display for MaskedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short values are masked entirely
        if self.inner.chars().count() <= VISIBLE_PREFIX * 2 {
            return f.write_str("***");
        }
        let prefix: String = self.inner.chars().take(VISIBLE_PREFIX).collect();
        write!(f, "{}***", prefix)
    }
}

/// Mask an optional secret for display, `-` when absent
pub fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(v) => MaskedToken::new(v).to_string(),
        None => "-".to_string(),
    }
}

/// Whether a header carries a credential and must not be logged verbatim
pub fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "cookie" | "set-cookie" | "x-refresh-token"
    )
}

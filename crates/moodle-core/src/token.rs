//! Web-service token type.

use std::fmt;

/// The web-service token obtained at the end of the sign-in flow.
///
/// The platform issues it without an expiry; it is valid until a call
/// reports an authentication failure.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Create a new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in web-service requests.
    ///
    /// # Security
    ///
    /// Use only when building request bodies or persisting the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

//! Login credentials type.

use std::fmt;

/// Login credentials for the identity provider.
///
/// This type holds the identity (university e-mail or account name) and the
/// secret (password) posted to the provider's login form.
///
/// # Security
///
/// The secret is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use moodle_core::Credentials;
///
/// let creds = Credentials::new("a.student@innopolis.university", "hunter2");
/// assert_eq!(creds.identity(), "a.student@innopolis.university");
/// ```
#[derive(Clone)]
pub struct Credentials {
    identity: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Returns the identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the secret.
    ///
    /// # Security
    ///
    /// Use this only when building the login form body.
    /// Never log or display this value.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

// Intentionally hide the secret in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

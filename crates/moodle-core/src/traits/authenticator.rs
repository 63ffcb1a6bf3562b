//! Authenticator trait.

use async_trait::async_trait;

use crate::{Credentials, Result};

use super::WebService;

/// Something that turns credentials into an authenticated web-service client.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Client type produced on success.
    type Client: WebService;

    /// Run the sign-in and return a client bound to the obtained token.
    async fn authenticate(&self, credentials: Credentials) -> Result<Self::Client>;
}

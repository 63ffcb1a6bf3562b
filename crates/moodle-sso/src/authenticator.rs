//! Federated SSO authenticator.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, instrument};

use moodle_core::traits::Authenticator;
use moodle_core::{Credentials, Result};

use crate::client::MoodleClient;
use crate::config::ProviderConfig;
use crate::flow::{AuthFlow, ProviderPatterns};
use crate::transport::Session;

/// Signs in through the site's ADFS identity provider.
///
/// Holds only immutable configuration; every [`authenticate`] call runs its
/// own flow with its own cookie store, so one authenticator can serve
/// concurrent sign-ins.
///
/// [`authenticate`]: Authenticator::authenticate
#[derive(Debug, Clone)]
pub struct SsoAuthenticator {
    config: Arc<ProviderConfig>,
    patterns: Arc<ProviderPatterns>,
}

impl SsoAuthenticator {
    /// Create an authenticator for the given provider configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let patterns = ProviderPatterns::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            patterns: Arc::new(patterns),
        })
    }

    /// Authenticator for Innopolis University.
    pub fn innopolis() -> Result<Self> {
        Self::new(ProviderConfig::default())
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Sign in, failing with a cancellation error once `deadline` passes.
    ///
    /// The deadline covers the sign-in only; the returned client is not bound by it.
    #[instrument(skip(self, credentials), fields(identity = %credentials.identity()))]
    pub async fn authenticate_until(
        &self,
        credentials: Credentials,
        deadline: Instant,
    ) -> Result<MoodleClient> {
        let session = Session::new(&self.config)?.with_deadline(deadline);
        self.run(AuthFlow::with_session(&self.config, &self.patterns, session), credentials)
            .await
    }

    async fn run(&self, flow: AuthFlow<'_>, credentials: Credentials) -> Result<MoodleClient> {
        let (token, session) = flow.run(&credentials).await?;
        info!(site = %self.config.platform_url, "Authenticated");
        MoodleClient::new(
            self.config.platform_url.clone(),
            token,
            session.without_deadline(),
        )
    }
}

#[async_trait]
impl Authenticator for SsoAuthenticator {
    type Client = MoodleClient;

    #[instrument(skip(self, credentials), fields(identity = %credentials.identity()))]
    async fn authenticate(&self, credentials: Credentials) -> Result<MoodleClient> {
        let flow = AuthFlow::new(&self.config, &self.patterns)?;
        self.run(flow, credentials).await
    }
}

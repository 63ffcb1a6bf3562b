//! Provider configuration.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use moodle_core::error::InvalidInputError;
use moodle_core::{BaseUrl, Result};

/// Innopolis University Moodle site.
pub const DEFAULT_PLATFORM_URL: &str = "https://moodle.innopolis.university";

/// Innopolis University ADFS identity provider.
pub const DEFAULT_PROVIDER_URL: &str = "https://sso.university.innopolis.ru";

/// Path of the mobile app launch page that starts the federated login.
pub const LAUNCH_PATH: &str = "/admin/tool/mobile/launch.php";

/// Endpoints and transport settings for one site / identity provider pair.
///
/// `Default` yields the Innopolis University constants. The platform checks
/// `service`, `passport` and `url_scheme` against the official mobile app,
/// so they should only be changed for test servers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the Moodle site.
    pub platform_url: BaseUrl,
    /// Base URL of the identity provider.
    pub provider_url: BaseUrl,
    /// Mobile web-service identifier.
    pub service: String,
    /// Launch passport value.
    pub passport: String,
    /// Custom URI scheme the token is delivered on.
    pub url_scheme: String,
    /// Timeout applied to every single request.
    pub request_timeout_secs: u64,
    /// Maximum redirects followed by one request.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            platform_url: builtin_url(DEFAULT_PLATFORM_URL),
            provider_url: builtin_url(DEFAULT_PROVIDER_URL),
            service: "moodle_mobile_app".to_string(),
            passport: "12.34567890".to_string(),
            url_scheme: "moodlemobile".to_string(),
            request_timeout_secs: 30,
            max_redirects: 10,
            user_agent: concat!("moodle-sso/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// The built-in constants are known-good URLs.
fn builtin_url(s: &str) -> BaseUrl {
    match BaseUrl::new(s) {
        Ok(url) => url,
        Err(err) => unreachable!("built-in URL {s} is invalid: {err}"),
    }
}

impl ProviderConfig {
    /// Create a configuration for custom platform and provider origins.
    pub fn new(platform_url: &str, provider_url: &str) -> Result<Self> {
        Ok(Self {
            platform_url: BaseUrl::new(platform_url)?,
            provider_url: BaseUrl::new(provider_url)?,
            ..Self::default()
        })
    }

    /// Defaults overlaid with `MOODLE_PLATFORM_URL`, `MOODLE_PROVIDER_URL`
    /// and `MOODLE_REQUEST_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("MOODLE_PLATFORM_URL") {
            config.platform_url = BaseUrl::new(&value)?;
        }
        if let Ok(value) = std::env::var("MOODLE_PROVIDER_URL") {
            config.provider_url = BaseUrl::new(&value)?;
        }
        if let Ok(value) = std::env::var("MOODLE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs =
                value.parse().map_err(|_| InvalidInputError::Other {
                    message: format!("MOODLE_REQUEST_TIMEOUT_SECS must be an integer, got '{value}'"),
                })?;
        }

        debug!(platform = %config.platform_url, provider = %config.provider_url, "Loaded provider config");
        Ok(config)
    }

    /// Mobile launch URL that starts the sign-in flow.
    pub fn entry_url(&self) -> Result<Url> {
        let raw = self.platform_url.join(LAUNCH_PATH);
        let mut url = Url::parse(&raw).map_err(|e| InvalidInputError::BaseUrl {
            value: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("service", &self.service)
            .append_pair("passport", &self.passport)
            .append_pair("urlscheme", &self.url_scheme);
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

//! Authenticated web-service client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, trace};
use url::Url;

use moodle_core::error::{InvalidInputError, RpcError};
use moodle_core::model::{Course, Section};
use moodle_core::traits::WebService;
use moodle_core::{BaseUrl, Result, RpcCall, RpcCallResult, Token};

use crate::config::ProviderConfig;
use crate::envelope::{
    GET_COURSE_CONTENTS, GET_RECENT_COURSES, REST_PATH, decode_batch, encode_batch, query,
};
use crate::transport::Session;

/// A client bound to one site, one token and one HTTP session.
///
/// Cheap to clone; clones share the session.
///
/// # Example
///
/// ```no_run
/// use moodle_core::{Authenticator, Credentials};
/// use moodle_sso::SsoAuthenticator;
///
/// # async fn example() -> Result<(), moodle_core::Error> {
/// let authenticator = SsoAuthenticator::innopolis()?;
/// let client = authenticator
///     .authenticate(Credentials::new("a.student@innopolis.university", "password"))
///     .await?;
///
/// for course in client.recent_courses().await? {
///     println!("{}: {}", course.id, course.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MoodleClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: BaseUrl,
    endpoint: Url,
    token: Token,
    session: Session,
}

impl MoodleClient {
    /// Create a client from a token and the session that obtained it.
    pub fn new(base_url: BaseUrl, token: Token, session: Session) -> Result<Self> {
        let raw = base_url.join(REST_PATH);
        let mut endpoint = Url::parse(&raw).map_err(|e| InvalidInputError::BaseUrl {
            value: raw.clone(),
            reason: e.to_string(),
        })?;
        endpoint.query_pairs_mut().extend_pairs(query());

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                endpoint,
                token,
                session,
            }),
        })
    }

    /// Create a client from a previously obtained token with a fresh session.
    ///
    /// The caller is responsible for the token still being valid.
    pub fn from_token(config: &ProviderConfig, token: Token) -> Result<Self> {
        let session = Session::new(config)?;
        Self::new(config.platform_url.clone(), token, session)
    }

    /// Returns the site this client talks to.
    pub fn base_url(&self) -> &BaseUrl {
        &self.inner.base_url
    }

    /// Returns the web-service token.
    ///
    /// # Security
    ///
    /// Handle the returned token securely. It grants access to the account.
    pub fn token(&self) -> &Token {
        &self.inner.token
    }

    // ========================================================================
    // Course Operations
    // ========================================================================

    /// Courses the user accessed most recently.
    #[instrument(skip(self), fields(site = %self.inner.base_url))]
    pub async fn recent_courses(&self) -> Result<Vec<Course>> {
        debug!("Fetching recent courses");
        let payload = self.call(GET_RECENT_COURSES, "").await?;
        Ok(decode_payload(GET_RECENT_COURSES, &payload)?)
    }

    /// Sections of a course, including their modules.
    #[instrument(skip(self), fields(site = %self.inner.base_url))]
    pub async fn course_sections(&self, course_id: i64) -> Result<Vec<Section>> {
        debug!("Fetching course sections");
        let arguments = json!({
            "courseid": course_id.to_string(),
            "options": [
                {"name": "excludemodules", "value": "0"},
                {"name": "excludecontents", "value": "0"},
                {"name": "includestealthmodules", "value": "1"},
            ],
        });
        let payload = self
            .call(GET_COURSE_CONTENTS, &arguments.to_string())
            .await?;
        Ok(decode_payload(GET_COURSE_CONTENTS, &payload)?)
    }
}

#[async_trait]
impl WebService for MoodleClient {
    #[instrument(skip(self, calls), fields(site = %self.inner.base_url, calls = calls.len()))]
    async fn call_many(&self, calls: &[RpcCall]) -> Result<Vec<RpcCallResult>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let functions: Vec<&str> = calls.iter().map(RpcCall::function).collect();
        debug!(?functions, "Web-service batch");

        let form = encode_batch(calls, &self.inner.token);
        let page = self
            .inner
            .session
            .request(
                Method::POST,
                self.inner.endpoint.as_str(),
                Some(&form),
                HeaderMap::new(),
            )
            .await?;
        trace!(status = %page.status, bytes = page.body.len(), "Web-service response");

        Ok(decode_batch(page.status.as_u16(), &page.body, calls.len())?)
    }
}

fn decode_payload<T: DeserializeOwned>(
    function: &str,
    payload: &str,
) -> std::result::Result<T, RpcError> {
    serde_json::from_str(payload).map_err(|e| RpcError::Payload {
        function: function.to_string(),
        message: e.to_string(),
    })
}

// Custom Debug impl that hides the token
impl std::fmt::Debug for MoodleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodleClient")
            .field("base_url", &self.inner.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

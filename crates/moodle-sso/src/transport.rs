//! Cookie-carrying HTTP session shared by every request of a sign-in.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, redirect};
use tokio::time::Instant;
use tracing::{debug, instrument, trace};
use url::Url;
use url::form_urlencoded;

use moodle_core::error::TransportError;

use crate::config::ProviderConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An HTTP session bound to a single cookie store.
///
/// Cookies assigned by the platform or the identity provider are kept across
/// every request made through the same session, including requests whose
/// redirects are followed manually. A session belongs to one sign-in at a
/// time; concurrent sign-ins each need their own.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    unfollowed: reqwest::Client,
    timeout: Duration,
    deadline: Option<Instant>,
}

/// A fetched page after all automatic redirects.
#[derive(Debug, Clone)]
pub struct Page {
    pub final_url: Url,
    pub status: StatusCode,
    pub body: String,
}

/// URL-form-encoded request body.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping insertion order.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the value of the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

// Field values may hold passwords or tokens; only names are shown.
impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|(name, _)| name))
            .finish()
    }
}

impl Session {
    /// Create a fresh session with an empty cookie store.
    pub fn new(config: &ProviderConfig) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let timeout = config.request_timeout();

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_provider(Arc::clone(&jar))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(e, timeout))?;

        let unfollowed = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_provider(jar)
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(e, timeout))?;

        Ok(Self {
            client,
            unfollowed,
            timeout,
            deadline: None,
        })
    }

    /// Fail every later request of this session once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Lift the deadline, keeping the cookie store.
    pub fn without_deadline(mut self) -> Self {
        self.deadline = None;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Send a request, following redirects, and read the whole body.
    ///
    /// HTTP error statuses are returned as pages, not errors; callers decide
    /// from the body whether the step worked.
    #[instrument(skip(self, body, headers), fields(%method, %url))]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Form>,
        headers: HeaderMap,
    ) -> Result<Page, TransportError> {
        debug!("HTTP request");

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(form) = body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(form.encode());
        }

        let response = self.guard(builder.send()).await?;
        let final_url = response.url().clone();
        let status = response.status();
        let body = self.guard(response.text()).await?;
        trace!(%final_url, %status, bytes = body.len(), "HTTP response");

        Ok(Page {
            final_url,
            status,
            body,
        })
    }

    /// GET a page.
    pub async fn get(&self, url: &str) -> Result<Page, TransportError> {
        self.request(Method::GET, url, None, HeaderMap::new()).await
    }

    /// POST a URL-form-encoded body.
    pub async fn post_form(&self, url: &str, form: &Form) -> Result<Page, TransportError> {
        self.request(Method::POST, url, Some(form), HeaderMap::new())
            .await
    }

    /// Send one request without following its redirect, returning the raw
    /// response so the caller can inspect `Location`.
    pub(crate) async fn send_unfollowed(
        &self,
        method: Method,
        url: &Url,
        body: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let mut builder = self.unfollowed.request(method, url.clone());
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(body.to_string());
        }
        self.guard(builder.send()).await
    }

    async fn guard<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| TransportError::Cancelled)?,
            None => fut.await,
        };
        result.map_err(|e| transport_error(e, self.timeout))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("timeout", &self.timeout)
            .field("deadline", &self.deadline)
            .field("cookies", &"[REDACTED]")
            .finish()
    }
}

pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_redirect() {
        TransportError::Redirect {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

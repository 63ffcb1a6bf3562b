//! The federated sign-in state machine.
//!
//! One [`AuthFlow`] drives one sign-in through the platform's mobile launch
//! page, the identity provider's login form and the auto-submitting token
//! form, ending at the custom-scheme redirect that carries the token:
//!
//! ```text
//! Start ──GET launch──▶ RedirectedToProvider ──GET login link──▶
//! CredentialsSubmission ──POST form──▶ TokenFormSubmission ──POST code/state──▶
//! TokenCaptured ──base64──▶ TokenDecode
//! ```
//!
//! Each step consumes exactly what the previous one extracted. There are no
//! retries; a failure ends the flow with the step it happened in.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use tracing::{debug, info, instrument};

use moodle_core::error::{FlowError, FlowFailure, PatternNotFound, TokenFormField};
use moodle_core::{Credentials, FlowState, Result, Token};

use crate::config::ProviderConfig;
use crate::extract::{
    ExtractionPattern, PROVIDER_LOGIN_FORM, TOKEN_FORM_ACTION, TOKEN_FORM_CODE, TOKEN_FORM_STATE,
    entry_login_link,
};
use crate::intercept::{SentinelPattern, Traversal, follow_intercepting};
use crate::transport::{Form, Page, Session};

/// Separator between the segments of the decoded token value.
const TOKEN_SEPARATOR: &str = ":::";

/// Patterns that depend on the configured origins.
///
/// Build once per configuration and share between flows.
#[derive(Debug, Clone)]
pub struct ProviderPatterns {
    pub entry_login_link: ExtractionPattern,
    pub sentinel: SentinelPattern,
}

impl ProviderPatterns {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            entry_login_link: entry_login_link(&config.platform_url)?,
            sentinel: SentinelPattern::new(&config.url_scheme)?,
        })
    }
}

/// A single sign-in attempt.
///
/// Owns its [`Session`]; on success the session (with the site's cookies)
/// is returned alongside the token.
#[derive(Debug)]
pub struct AuthFlow<'a> {
    config: &'a ProviderConfig,
    patterns: &'a ProviderPatterns,
    session: Session,
    state: FlowState,
}

impl<'a> AuthFlow<'a> {
    /// Start a flow with a fresh session.
    pub fn new(config: &'a ProviderConfig, patterns: &'a ProviderPatterns) -> Result<Self> {
        let session = Session::new(config)?;
        Ok(Self::with_session(config, patterns, session))
    }

    /// Start a flow on an existing session (e.g. one with a deadline).
    pub fn with_session(
        config: &'a ProviderConfig,
        patterns: &'a ProviderPatterns,
        session: Session,
    ) -> Self {
        Self {
            config,
            patterns,
            session,
            state: FlowState::Start,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Run every step and return the token and the session that obtained it.
    #[instrument(skip_all, fields(identity = %credentials.identity()))]
    pub async fn run(mut self, credentials: &Credentials) -> Result<(Token, Session)> {
        info!("Starting sign-in");

        let login_link = self.open_launch_page().await?;
        self.advance();

        let form_path = self.open_provider_login(&login_link).await?;
        self.advance();

        let token_page = self.submit_credentials(&form_path, credentials).await?;
        self.advance();

        let captured = self.submit_token_form(&token_page).await?;
        self.advance();

        // The sentinel was seen; nothing left to fetch.
        self.advance();
        let token = decode_token(&captured)?;

        info!("Sign-in complete");
        Ok((token, self.session))
    }

    /// Start: fetch the launch page and find the federated login link.
    async fn open_launch_page(&self) -> Result<String> {
        let entry = self.config.entry_url()?;
        debug!(step = %self.state, url = %entry, "Opening launch page");

        let page = self.session.get(entry.as_str()).await.map_err(|e| self.fail(e))?;
        self.patterns
            .entry_login_link
            .extract(&page.body)
            .map_err(|e| self.fail(FlowFailure::EntryPointNotFound(e)))
    }

    /// RedirectedToProvider: follow the login link to the provider's form.
    async fn open_provider_login(&self, login_link: &str) -> Result<String> {
        debug!(step = %self.state, "Following login link");

        let page = self.session.get(login_link).await.map_err(|e| self.fail(e))?;
        debug!(provider_page = %page.final_url, status = %page.status, "Reached provider");
        PROVIDER_LOGIN_FORM
            .extract(&page.body)
            .map_err(|e| self.fail(FlowFailure::LoginFormNotFound(e)))
    }

    /// CredentialsSubmission: post the login form, returning the token page.
    async fn submit_credentials(
        &self,
        form_path: &str,
        credentials: &Credentials,
    ) -> Result<Page> {
        let url = self.config.provider_url.join(form_path);
        debug!(step = %self.state, "Submitting credentials");

        let form = Form::new()
            .field("UserName", credentials.identity())
            .field("Password", credentials.secret())
            .field("Kmsi", "true")
            .field("AuthMethod", "FormsAuthentication");

        let page = self
            .session
            .post_form(&url, &form)
            .await
            .map_err(|e| self.fail(e))?;
        debug!(status = %page.status, "Credentials submitted");
        Ok(page)
    }

    /// TokenFormSubmission: replay the hidden form and intercept the token.
    async fn submit_token_form(&self, token_page: &Page) -> Result<String> {
        let extract_field = |pattern: &ExtractionPattern, field: TokenFormField| {
            pattern
                .extract(&token_page.body)
                .map_err(|source| self.fail(FlowFailure::TokenFormFieldMissing { field, source }))
        };
        let action = extract_field(&TOKEN_FORM_ACTION, TokenFormField::Action)?;
        let code = extract_field(&TOKEN_FORM_CODE, TokenFormField::Code)?;
        let state = extract_field(&TOKEN_FORM_STATE, TokenFormField::State)?;

        // Relative actions resolve against the page that carried the form.
        let action = token_page.final_url.join(&action).map_err(|_| {
            self.fail(FlowFailure::TokenFormFieldMissing {
                field: TokenFormField::Action,
                source: PatternNotFound {
                    pattern: TOKEN_FORM_ACTION.name(),
                },
            })
        })?;
        debug!(step = %self.state, action = %action, "Submitting token form");

        let form = Form::new().field("code", code).field("state", state);
        let traversal = follow_intercepting(
            &self.session,
            &self.patterns.sentinel,
            Method::POST,
            action,
            Some(&form),
            self.config.max_redirects,
        )
        .await
        .map_err(|e| self.fail(e))?;

        match traversal {
            Traversal::Captured { value, .. } => Ok(value),
            Traversal::Completed { final_url, status } => {
                Err(self.fail(FlowFailure::TokenNotInRedirect {
                    final_url: final_url.to_string(),
                    status: status.as_u16(),
                }))
            }
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.state = next;
        }
    }

    fn fail(&self, reason: impl Into<FlowFailure>) -> moodle_core::Error {
        FlowError::new(self.state, reason).into()
    }
}

/// Decode the captured sentinel value into the web-service token.
///
/// The value is standard base64 of `<site hash>:::<token>[:::<private token>]`;
/// the second segment is the token.
pub fn decode_token(captured: &str) -> std::result::Result<Token, FlowError> {
    let malformed = |reason: String| {
        FlowError::new(FlowState::TokenDecode, FlowFailure::MalformedToken { reason })
    };

    let bytes = STANDARD
        .decode(captured.trim())
        .map_err(|e| malformed(format!("invalid base64: {e}")))?;
    let text = String::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {e}")))?;

    let mut parts = text.split(TOKEN_SEPARATOR);
    match (parts.next(), parts.next()) {
        (Some(_), Some(token)) => Ok(Token::new(token)),
        _ => Err(malformed(format!(
            "expected at least 2 '{TOKEN_SEPARATOR}'-separated parts"
        ))),
    }
}

//! moodle-sso - Sign in to Moodle through ADFS single sign-on and call its
//! web services.
//!
//! The sign-in replays the official mobile app's browser flow: launch page,
//! identity provider login form, auto-submitting token form, and finally a
//! `moodlemobile://token=...` redirect that carries the web-service token.
//! The resulting [`MoodleClient`] batches calls through
//! `tool_mobile_call_external_functions`.

pub mod authenticator;
pub mod client;
pub mod config;
pub mod envelope;
pub mod extract;
pub mod flow;
pub mod intercept;
pub mod transport;

pub use authenticator::SsoAuthenticator;
pub use client::MoodleClient;
pub use config::ProviderConfig;
pub use flow::{AuthFlow, ProviderPatterns, decode_token};
pub use intercept::{SentinelPattern, Traversal};
pub use transport::{Form, Page, Session};

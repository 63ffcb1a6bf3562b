//! Sign-in flow states.

use std::fmt;

/// Position in the federated sign-in chain.
///
/// States are ordered; a flow only ever moves to a later state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowState {
    /// Fetching the platform's mobile launch page.
    Start,
    /// Following the federated login link to the identity provider.
    RedirectedToProvider,
    /// Posting the username and password to the provider's form.
    CredentialsSubmission,
    /// Replaying the auto-submitting token form.
    TokenFormSubmission,
    /// The token sentinel was captured from the redirect chain.
    TokenCaptured,
    /// Decoding the captured value into the API token.
    TokenDecode,
}

impl FlowState {
    /// Returns the state that follows this one, if any.
    pub fn next(self) -> Option<FlowState> {
        match self {
            FlowState::Start => Some(FlowState::RedirectedToProvider),
            FlowState::RedirectedToProvider => Some(FlowState::CredentialsSubmission),
            FlowState::CredentialsSubmission => Some(FlowState::TokenFormSubmission),
            FlowState::TokenFormSubmission => Some(FlowState::TokenCaptured),
            FlowState::TokenCaptured => Some(FlowState::TokenDecode),
            FlowState::TokenDecode => None,
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

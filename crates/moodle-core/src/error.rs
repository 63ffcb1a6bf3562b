//! Error types for Moodle sign-in and web-service calls.
//!
//! This module provides a unified error type with explicit variants for
//! transport, sign-in flow, web-service and input validation errors.

use std::fmt;
use thiserror::Error;

use crate::flow::FlowState;

/// The unified error type for moodle operations.
///
/// Each variant maps to one failure class so callers can decide whether a
/// retry makes sense (transport) or the attempt is fatal (flow, rpc).
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, cancellation).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A sign-in flow step failed.
    #[error("sign-in failed: {0}")]
    Flow(#[from] FlowError),

    /// Web-service envelope errors.
    #[error("web service error: {0}")]
    Rpc(#[from] RpcError),

    /// Input validation errors (invalid URL, configuration).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns `true` if the failure came from the network rather than from
    /// the provider's markup or the web service itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Flow(err) => err.is_transport(),
            _ => false,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The caller's deadline passed before the request completed.
    #[error("request cancelled: deadline exceeded")]
    Cancelled,

    /// Redirect chain could not be followed.
    #[error("redirect error: {message}")]
    Redirect { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A named extraction pattern found no match in a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern `{pattern}` not found in page")]
pub struct PatternNotFound {
    /// Name of the pattern that failed.
    pub pattern: &'static str,
}

/// Hidden field of the intermediate token page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormField {
    /// The form's `action` attribute.
    Action,
    /// The hidden `code` input.
    Code,
    /// The hidden `state` input.
    State,
}

impl fmt::Display for TokenFormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenFormField::Action => "action",
            TokenFormField::Code => "code",
            TokenFormField::State => "state",
        };
        f.write_str(name)
    }
}

/// Why a sign-in flow step failed.
#[derive(Debug, Error)]
pub enum FlowFailure {
    /// The platform's launch page no longer links to the federated login.
    #[error("entry point not found: {0}")]
    EntryPointNotFound(PatternNotFound),

    /// The identity provider page has no recognisable login form.
    #[error("login form not found: {0}")]
    LoginFormNotFound(PatternNotFound),

    /// The auto-submitting token page lacks one of its fields.
    ///
    /// Rejected credentials also end up here: the provider answers with its
    /// login page again, which has no token form.
    #[error("token form field `{field}` missing: {source}")]
    TokenFormFieldMissing {
        field: TokenFormField,
        source: PatternNotFound,
    },

    /// No redirect in the chain carried the token sentinel.
    #[error("token not found in redirect chain (ended at {final_url} with HTTP {status})")]
    TokenNotInRedirect { final_url: String, status: u16 },

    /// The captured token did not decode into the expected shape.
    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },

    /// The step's request failed on the network.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A sign-in flow failure, tagged with the step it happened in.
#[derive(Debug, Error)]
#[error("step {step}: {reason}")]
pub struct FlowError {
    /// The flow state that was active when the failure occurred.
    pub step: FlowState,
    /// The failure itself.
    #[source]
    pub reason: FlowFailure,
}

impl FlowError {
    /// Create a new flow error.
    pub fn new(step: FlowState, reason: impl Into<FlowFailure>) -> Self {
        Self {
            step,
            reason: reason.into(),
        }
    }

    /// Check if this failure was caused by the network.
    pub fn is_transport(&self) -> bool {
        matches!(self.reason, FlowFailure::Transport(_))
    }
}

/// Web-service envelope errors.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A single remote call reported failure. The envelope carries no
    /// usable code or message for it.
    #[error("remote call `{function}` failed")]
    CallFailed { function: String },

    /// The server rejected the whole batch with an exception object.
    #[error("server exception [{errorcode}]: {message}")]
    Exception { errorcode: String, message: String },

    /// The response body was not a valid envelope.
    #[error("malformed response (HTTP {status}): {message}")]
    MalformedResponse { status: u16, message: String },

    /// The server answered a different number of calls than requested.
    #[error("expected {expected} responses, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A successful payload could not be decoded into its domain type.
    #[error("failed to decode `{function}` payload: {message}")]
    Payload { function: String, message: String },
}

impl RpcError {
    /// Check if the server refused the token.
    pub fn is_auth_error(&self) -> bool {
        match self {
            RpcError::Exception { errorcode, .. } => {
                errorcode == "invalidtoken" || errorcode == "accessexception"
            }
            _ => false,
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL format.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_error_reports_step_and_pattern() {
        let err = FlowError::new(
            FlowState::TokenFormSubmission,
            FlowFailure::TokenFormFieldMissing {
                field: TokenFormField::Code,
                source: PatternNotFound {
                    pattern: "token_form_code",
                },
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("TokenFormSubmission"));
        assert!(msg.contains("`code`"));
        assert!(msg.contains("token_form_code"));
    }

    #[test]
    fn transport_failures_are_retryable() {
        let top: Error = TransportError::Timeout { duration_ms: 10 }.into();
        assert!(top.is_retryable());

        let in_flow: Error = FlowError::new(FlowState::Start, TransportError::Cancelled).into();
        assert!(in_flow.is_retryable());

        let markup: Error = FlowError::new(
            FlowState::Start,
            FlowFailure::EntryPointNotFound(PatternNotFound {
                pattern: "entry_login_link",
            }),
        )
        .into();
        assert!(!markup.is_retryable());
    }

    #[test]
    fn invalid_token_exception_is_auth_error() {
        let err = RpcError::Exception {
            errorcode: "invalidtoken".to_string(),
            message: "Invalid token - token not found".to_string(),
        };
        assert!(err.is_auth_error());

        let err = RpcError::CallFailed {
            function: "core_course_get_recent_courses".to_string(),
        };
        assert!(!err.is_auth_error());
    }
}

//! Web-service call and result types.

use serde::de::DeserializeOwned;

use crate::error::RpcError;

/// One named remote function call inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    function: String,
    arguments: String,
}

impl RpcCall {
    /// Create a call with a JSON-encoded argument object.
    ///
    /// An empty `arguments` string means the call takes no arguments.
    pub fn new(function: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            arguments: arguments.into(),
        }
    }

    /// Create a call without arguments.
    pub fn without_arguments(function: impl Into<String>) -> Self {
        Self::new(function, String::new())
    }

    /// Returns the remote function name.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the JSON-encoded arguments (possibly empty).
    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

/// Outcome of one call in a batch, in the same position as its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCallResult {
    /// The call succeeded; holds the raw JSON payload.
    Success(String),
    /// The call failed. The envelope gives no reason.
    Failed,
}

impl RpcCallResult {
    /// Returns `true` for a successful call.
    pub fn is_success(&self) -> bool {
        matches!(self, RpcCallResult::Success(_))
    }

    /// Returns the JSON payload of a successful call.
    pub fn payload(&self) -> Option<&str> {
        match self {
            RpcCallResult::Success(payload) => Some(payload),
            RpcCallResult::Failed => None,
        }
    }

    /// Converts into the payload, attributing a failure to `function`.
    pub fn into_payload(self, function: &str) -> Result<String, RpcError> {
        match self {
            RpcCallResult::Success(payload) => Ok(payload),
            RpcCallResult::Failed => Err(RpcError::CallFailed {
                function: function.to_string(),
            }),
        }
    }

    /// Decodes a successful payload into `T`.
    pub fn decode<T: DeserializeOwned>(&self, function: &str) -> Result<T, RpcError> {
        let payload = self.payload().ok_or_else(|| RpcError::CallFailed {
            function: function.to_string(),
        })?;
        serde_json::from_str(payload).map_err(|e| RpcError::Payload {
            function: function.to_string(),
            message: e.to_string(),
        })
    }
}

//! Web-service trait.

use async_trait::async_trait;

use crate::error::RpcError;
use crate::rpc::{RpcCall, RpcCallResult};
use crate::Result;

/// An authenticated handle on a site's web-service functions.
#[async_trait]
pub trait WebService: Send + Sync {
    /// Invoke a batch of functions in one request.
    ///
    /// Results are returned in request order. A failed call does not fail the
    /// batch; only transport or envelope errors do.
    async fn call_many(&self, calls: &[RpcCall]) -> Result<Vec<RpcCallResult>>;

    /// Invoke a single function and return its JSON payload.
    async fn call(&self, function: &str, arguments: &str) -> Result<String> {
        let calls = [RpcCall::new(function, arguments)];
        let result = self
            .call_many(&calls)
            .await?
            .into_iter()
            .next()
            .ok_or(RpcError::LengthMismatch {
                expected: 1,
                actual: 0,
            })?;
        Ok(result.into_payload(function)?)
    }
}

//! moodle-core - Core types and traits for Moodle sign-in and web services.

pub mod credentials;
pub mod error;
pub mod flow;
pub mod model;
pub mod rpc;
pub mod token;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::Error;
pub use flow::FlowState;
pub use rpc::{RpcCall, RpcCallResult};
pub use token::Token;
pub use traits::{Authenticator, WebService};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

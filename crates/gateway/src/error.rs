//! The types of errors that might occur while talking to the node.

use thiserror::Error;

/// Shorthand for a `Result` where the error type is a `GatewayError`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A node request failed.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The endpoint configuration is not a valid URL.
    #[error("invalid node endpoint `{0}`")]
    InvalidEndpoint(String),
    /// The HTTP request could not be completed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The node answered with a non-success status.
    #[error("node returned {code}: {message}")]
    Status {
        /// The HTTP status code.
        code: u16,
        /// The response body.
        message: String,
    },
    /// The node's response could not be decoded.
    #[error("failed to decode node response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The group was rejected from the transaction pool.
    #[error("transaction group rejected: {0}")]
    Rejected(String),
    /// The group was not confirmed within the allowed number of rounds.
    #[error("transaction group not confirmed after {rounds} rounds")]
    Timeout {
        /// The number of rounds waited.
        rounds: u64,
    },
    /// The group is empty.
    #[error("cannot submit an empty transaction group")]
    EmptyGroup,
}

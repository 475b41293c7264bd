//! Specifies the contract of a text-generation oracle which proposes new candidates.
//!
//! The transport itself is out of the core: users plug in a client which implements [`Oracle`].

mod retry;
pub use self::retry::*;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An error returned by oracle client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleError {
    /// A network or service failure, worth another try.
    Transport(String),
    /// The service asks to slow down, worth another try after a pause.
    RateLimited(String),
    /// The request is refused and repeating it makes no sense.
    Rejected(String),
}

impl OracleError {
    /// Returns true if the request can be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::Transport(_) | OracleError::RateLimited(_))
    }
}

impl Display for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Transport(msg) => write!(f, "oracle transport error: {msg}"),
            OracleError::RateLimited(msg) => write!(f, "oracle rate limit: {msg}"),
            OracleError::Rejected(msg) => write!(f, "oracle rejected request: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// A text-generation service which completes a prompt.
pub trait Oracle {
    /// Sends a prompt to the given model and returns generated text.
    fn complete(&self, model: &str, prompt: &str) -> Result<String, OracleError>;
}

impl<F> Oracle for F
where
    F: Fn(&str, &str) -> Result<String, OracleError>,
{
    fn complete(&self, model: &str, prompt: &str) -> Result<String, OracleError> {
        (self)(model, prompt)
    }
}

/// A shared oracle client handle.
pub type OracleClient = Arc<dyn Oracle + Send + Sync>;

/// Oracle settings: which model to use and the client which talks to it.
#[derive(Clone)]
pub struct OracleConfig {
    /// A model identifier passed to the client.
    pub model: String,
    /// A client handle.
    pub client: OracleClient,
}

impl OracleConfig {
    /// Creates a new instance of `OracleConfig`.
    pub fn new(model: impl Into<String>, client: OracleClient) -> Self {
        Self { model: model.into(), client }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig").field("model", &self.model).finish_non_exhaustive()
    }
}

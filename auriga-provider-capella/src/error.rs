//! Errors raised while talking to the Capella management API.

use auriga_core::provider::ProviderError;
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the Capella v4 management API.
#[derive(Debug, Clone, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message} (code {code}, http status {http_status_code}): {hint}")]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub http_status_code: u16,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Whether this error means the remote resource no longer exists.
    /// Deletion-flow polling treats this as successful completion.
    pub fn is_not_found(&self) -> bool {
        self.http_status_code == 404
    }
}

/// Errors from the HTTP execution layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API token format")]
    InvalidToken,

    #[error("failed to marshal payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("failed to construct request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to execute request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("client timeout executing request: {0}")]
    TimedOut(#[source] reqwest::Error),

    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("error parsing Retry-After value from response header")]
    RetryAfterInvalid,

    #[error("gateway timeout executing request")]
    GatewayTimeout,

    #[error("failed to unmarshal response: {0}")]
    Response(#[source] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("unexpected code: {got}, expected: {want}, body: {body}")]
    UnexpectedStatus { got: u16, want: u16, body: String },

    #[error("timed out executing request against api: {url}")]
    RetryBudgetExhausted { url: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_not_found())
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        if err.is_not_found() {
            ProviderError::not_found(message).with_cause(err)
        } else {
            ProviderError::new(message).with_cause(err)
        }
    }
}

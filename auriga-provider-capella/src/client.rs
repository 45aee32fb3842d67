//! HTTP execution against the Capella management API.
//!
//! [`CapellaClient`] is responsible for constructing and executing HTTP
//! requests: bearer-token auth, JSON bodies, per-endpoint expected success
//! status, and the retry policy for rate limits, gateway timeouts, and
//! client-side timeouts.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, StatusCode};
use tokio::time::{self, Instant};

use crate::error::{ApiError, ClientError};

const USER_AGENT_VALUE: &str = concat!("auriga-provider-capella/", env!("CARGO_PKG_VERSION"));

/// Re-attempt retryable requests after 2 seconds.
const DEFAULT_WAIT_ATTEMPT: Duration = Duration::from_secs(2);

/// Hard budget for one logical request including all retries.
const RETRY_BUDGET: Duration = Duration::from_secs(600);

/// Capella error code for a gateway timeout during index DDL, which must not
/// be retried (the statement may already be executing server-side).
const GATEWAY_TIMEOUT_INDEX_DDL: i64 = 7001;

/// EndpointCfg is used to encapsulate request details to endpoints.
#[derive(Debug, Clone)]
pub struct EndpointCfg {
    /// Url of the endpoint to be contacted
    pub url: String,

    /// HTTP method to be requested
    pub method: Method,

    /// HTTP status code associated with a successful response from the
    /// endpoint
    pub success_status: StatusCode,
}

impl EndpointCfg {
    pub fn new(url: impl Into<String>, method: Method, success_status: StatusCode) -> Self {
        Self {
            url: url.into(),
            method,
            success_status,
        }
    }
}

/// Response details of a successful call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(ClientError::Response)
    }
}

/// Client is responsible for constructing and executing HTTP requests.
#[derive(Clone)]
pub struct CapellaClient {
    http: reqwest::Client,
}

impl CapellaClient {
    /// Instantiates a new client holding the bearer token with the provided
    /// per-request timeout.
    pub fn new(token: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { http })
    }

    /// Construct and execute a HTTP request, retrying retryable failures
    /// until the retry budget is exhausted.
    ///
    /// Rate limits wait for the server-specified `Retry-After`, gateway
    /// timeouts re-attempt after a fixed delay, and client-side timeouts back
    /// off exponentially. Everything else is returned to the caller as-is.
    pub async fn execute_with_retry(
        &self,
        cfg: &EndpointCfg,
        payload: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ClientError> {
        let deadline = Instant::now() + RETRY_BUDGET;
        let mut timeout_attempts: u32 = 0;

        loop {
            let delay = match self.attempt(cfg, payload).await {
                Ok(response) => return Ok(response),
                Err(ClientError::RateLimited { retry_after }) => {
                    tracing::debug!(
                        method = %cfg.method,
                        url = %cfg.url,
                        retry_after,
                        "API rate limited"
                    );
                    Duration::from_secs(retry_after)
                }
                Err(ClientError::GatewayTimeout) => {
                    tracing::debug!(method = %cfg.method, url = %cfg.url, "gateway timeout, will retry");
                    DEFAULT_WAIT_ATTEMPT
                }
                Err(ClientError::TimedOut(err)) => {
                    tracing::debug!(
                        method = %cfg.method,
                        url = %cfg.url,
                        error = %err,
                        "client timeout detected, will retry"
                    );
                    timeout_attempts += 1;
                    DEFAULT_WAIT_ATTEMPT.saturating_mul(1 << timeout_attempts.min(8))
                }
                Err(err) => return Err(err),
            };

            if Instant::now() + delay >= deadline {
                return Err(ClientError::RetryBudgetExhausted {
                    url: cfg.url.clone(),
                });
            }
            time::sleep(delay).await;
        }
    }

    /// One request/response cycle, classifying the response against the
    /// endpoint's expected success status.
    async fn attempt(
        &self,
        cfg: &EndpointCfg,
        payload: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut request = self.http.request(cfg.method.clone(), &cfg.url);
        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::TimedOut(e)
            } else {
                ClientError::Transport(e)
            }
        })?;

        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).cloned();
        let body = response.bytes().await.map_err(ClientError::Transport)?;

        if status == cfg.success_status {
            return Ok(ApiResponse {
                status,
                body: body.to_vec(),
            });
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let secs = retry_after
                    .as_ref()
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or(ClientError::RetryAfterInvalid)?;
                Err(ClientError::RateLimited { retry_after: secs })
            }
            StatusCode::GATEWAY_TIMEOUT => {
                let api_error = parse_api_error(cfg, status, &body)?;
                if api_error.code == GATEWAY_TIMEOUT_INDEX_DDL {
                    return Err(ClientError::Api(api_error));
                }
                Err(ClientError::GatewayTimeout)
            }
            _ => Err(ClientError::Api(parse_api_error(cfg, status, &body)?)),
        }
    }
}

impl std::fmt::Debug for CapellaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapellaClient")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Interpret a non-success body as the Capella error envelope. Bodies that
/// are not the envelope (code 0) surface the raw status and body instead.
fn parse_api_error(
    cfg: &EndpointCfg,
    status: StatusCode,
    body: &[u8],
) -> Result<ApiError, ClientError> {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(mut api_error) if api_error.code != 0 => {
            if api_error.http_status_code == 0 {
                api_error.http_status_code = status.as_u16();
            }
            Ok(api_error)
        }
        _ => Err(ClientError::UnexpectedStatus {
            got: status.as_u16(),
            want: cfg.success_status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = CapellaClient::new("test-token", Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let client = CapellaClient::new("bad\ntoken", Duration::from_secs(10));
        assert!(matches!(client, Err(ClientError::InvalidToken)));
    }

    #[test]
    fn debug_does_not_expose_token() {
        let client = CapellaClient::new("super-secret-token-12345", Duration::from_secs(10)).unwrap();
        let debug_output = format!("{:?}", client);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token-12345"));
    }

    #[test]
    fn non_envelope_body_surfaces_raw_status() {
        let cfg = EndpointCfg::new("http://localhost/v4/x", Method::GET, StatusCode::OK);
        let err = parse_api_error(&cfg, StatusCode::BAD_GATEWAY, b"<html>oops</html>").unwrap_err();
        match err {
            ClientError::UnexpectedStatus { got, want, body } => {
                assert_eq!(got, 502);
                assert_eq!(want, 200);
                assert!(body.contains("oops"));
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn envelope_without_status_code_inherits_response_status() {
        let cfg = EndpointCfg::new("http://localhost/v4/x", Method::GET, StatusCode::OK);
        let body = br#"{"code":4025,"message":"cluster not found","hint":""}"#;
        let api_error = parse_api_error(&cfg, StatusCode::NOT_FOUND, body).unwrap();
        assert_eq!(api_error.http_status_code, 404);
        assert!(api_error.is_not_found());
    }
}

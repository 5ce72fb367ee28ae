//! HTTP client for an external verification endpoint.

use std::time::Duration;

use cvup_types::VerificationCode;
use serde::Deserialize;

use crate::{GateError, VerificationGate};

/// Default timeout for a verification request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Queries `GET {endpoint}/verify/{code}`.
///
/// The endpoint answers `{"verified": bool}`; `404` is read as "no trace of
/// this code yet" rather than an error.
pub struct HttpVerificationGate {
    endpoint: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
}

impl HttpVerificationGate {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GateError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GateError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GateError::Config(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| GateError::Config(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn url_for(&self, code: &VerificationCode) -> String {
        format!("{}/verify/{}", self.endpoint, code)
    }
}

impl VerificationGate for HttpVerificationGate {
    fn name(&self) -> &str {
        "http"
    }

    async fn is_verified(&self, code: &VerificationCode) -> Result<bool, GateError> {
        let url = self.url_for(code);
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                GateError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                GateError::Unreachable(format!("connection failed: {e}"))
            } else {
                GateError::RequestFailed(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(%code, "verification endpoint has no record of code");
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(GateError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: VerifyResponse = response.json().await.map_err(|e| {
            GateError::InvalidResponse(format!("failed to parse verification response: {e}"))
        })?;
        Ok(body.verified)
    }
}

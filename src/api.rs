//! Ocean API client.
//!
//! Two wire operations: an OAuth2 client-credentials token exchange and an
//! authenticated letter fetch returning opaque PDF bytes. No retries; the
//! transport timeout is the only timeout.

use std::time::Duration;

use base64::Engine;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::Credentials;

const USER_AGENT: &str = concat!("letterfetch/", env!("CARGO_PKG_VERSION"));

/// Errors from the Ocean API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read).
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Token endpoint returned a non-success status.
    #[error("Token exchange failed: HTTP {}", .status.as_u16())]
    TokenExchange { status: StatusCode },
    /// Token endpoint response carried no usable access token.
    #[error("Token response contained no access token")]
    MissingAccessToken,
    /// Letter endpoint returned a non-success status.
    #[error("HTTP error! status: {}", .status.as_u16())]
    Status { status: StatusCode },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// HTTP client bound to one Ocean host.
#[derive(Clone)]
pub struct OceanClient {
    http: Client,
    host: String,
}

impl OceanClient {
    /// Create a client for `host` (scheme + authority, no trailing slash).
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            host: host.into(),
        }
    }

    /// Exchange client credentials for a bearer access token.
    pub async fn fetch_access_token(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!(
                "{}:{}",
                credentials.client_id, credentials.client_secret
            ))
        );

        tracing::debug!("requesting access token from {}", self.host);

        let response = self
            .http
            .post(format!("{}/svc/oauth2/token", self.host))
            .query(&[("grant_type", "client_credentials")])
            .header(header::AUTHORIZATION, authorization)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::TokenExchange {
                status: response.status(),
            });
        }

        let token: TokenResponse = response.json().await?;
        match token.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::MissingAccessToken),
        }
    }

    /// Fetch the letter PDF for a referral reference.
    pub async fn fetch_letter(&self, token: &str, reference: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(format!(
                "{}/svc/fhir/v1/ServiceRequest/{}/$letter",
                self.host, reference
            ))
            .query(&[("attachments", "true")])
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_embeds_numeric_code() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "HTTP error! status: 404");
    }

    #[test]
    fn test_token_exchange_error_message() {
        let err = ApiError::TokenExchange {
            status: StatusCode::UNAUTHORIZED,
        };
        assert_eq!(err.to_string(), "Token exchange failed: HTTP 401");
    }
}

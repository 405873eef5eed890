//! Access token acquisition for the conversation backend.
//!
//! Two providers exist: a pre-issued bearer token handed over as-is, and a
//! browser session cookie exchanged at the session endpoint for a
//! short-lived access token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Name of the cookie the session endpoint authenticates with.
pub const SESSION_COOKIE_NAME: &str = "__Secure-next-auth.session-token";

/// Failure to obtain an access token. Always fatal for a harvest run.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credentials supplied: {0}")]
    MissingCredentials(String),

    #[error("session request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("session endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("session response did not contain an access token")]
    MissingAccessToken,
}

/// Source of the bearer token used for every backend request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

/// Token supplied up front (flag or environment).
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String, AuthError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredentials("empty access token".to_string()));
        }
        Ok(token.to_string())
    }
}

/// Exchanges a logged-in session cookie for an access token.
#[derive(Debug, Clone)]
pub struct SessionTokenProvider {
    http_client: Client,
    session_url: String,
    cookie: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires: Option<String>,
}

impl SessionTokenProvider {
    /// `cookie` is either the bare session token value or a full
    /// `name=value; ...` cookie header.
    pub fn new(session_url: impl Into<String>, cookie: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(http_client, session_url, cookie)
    }

    pub fn with_client(
        http_client: Client,
        session_url: impl Into<String>,
        cookie: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            session_url: session_url.into(),
            cookie: cookie.into(),
        }
    }

    fn cookie_header(&self) -> String {
        let cookie = self.cookie.trim();
        if cookie.contains('=') {
            cookie.to_string()
        } else {
            format!("{}={}", SESSION_COOKIE_NAME, cookie)
        }
    }
}

#[async_trait]
impl TokenProvider for SessionTokenProvider {
    async fn get_token(&self) -> Result<String, AuthError> {
        if self.cookie.trim().is_empty() {
            return Err(AuthError::MissingCredentials("empty session cookie".to_string()));
        }

        debug!("Requesting access token from {}", self.session_url);
        let response = self
            .http_client
            .get(&self.session_url)
            .header(COOKIE, self.cookie_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
            });
        }

        let session: SessionResponse = response.json().await?;
        let token = session
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        match session.expires.as_deref().and_then(parse_expiry) {
            Some(expires_at) => info!("Obtained access token (expires {})", expires_at),
            None => info!("Obtained access token"),
        }

        Ok(token)
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("  abc  ");
        assert_eq!(provider.get_token().await.unwrap(), "abc");

        let empty = StaticTokenProvider::new("");
        assert!(matches!(
            empty.get_token().await,
            Err(AuthError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_session_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/session"))
            .and(header("cookie", "__Secure-next-auth.session-token=cookie-value"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "token-123",
                "expires": "2030-01-01T00:00:00.000Z"
            })))
            .mount(&server)
            .await;

        let provider = SessionTokenProvider::new(
            format!("{}/api/auth/session", server.uri()),
            "cookie-value",
        );
        assert_eq!(provider.get_token().await.unwrap(), "token-123");
    }

    #[tokio::test]
    async fn test_session_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/session"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let provider = SessionTokenProvider::new(
            format!("{}/api/auth/session", server.uri()),
            "cookie-value",
        );
        assert!(matches!(
            provider.get_token().await,
            Err(AuthError::Status { status: 403 })
        ));
    }

    #[tokio::test]
    async fn test_session_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let provider = SessionTokenProvider::new(
            format!("{}/api/auth/session", server.uri()),
            "name=value; other=1",
        );
        assert!(matches!(
            provider.get_token().await,
            Err(AuthError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_cookie_header() {
        let bare = SessionTokenProvider::new("http://localhost", "abc");
        assert_eq!(bare.cookie_header(), "__Secure-next-auth.session-token=abc");

        let full = SessionTokenProvider::new("http://localhost", "a=1; b=2");
        assert_eq!(full.cookie_header(), "a=1; b=2");
    }
}

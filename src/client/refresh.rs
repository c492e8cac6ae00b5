use crate::error::AppError;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tokens issued by a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// Present only when the server rotated the refresh token
    pub refresh_token: Option<String>,
}

/// Remote procedure exchanging `(account_id, refresh_token)` for a new token pair
#[async_trait]
pub trait RefreshEndpoint: Send + Sync {
    async fn refresh(&self, account_id: &str, refresh_token: &str) -> Result<TokenPair, AppError>;
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    account_id: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    response: Option<RefreshPayload>,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
    #[serde(alias = "jwt_token")]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Refresh endpoint reached over HTTP
pub struct HttpRefreshEndpoint {
    client: Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpRefreshEndpoint {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RefreshEndpoint for HttpRefreshEndpoint {
    async fn refresh(&self, account_id: &str, refresh_token: &str) -> Result<TokenPair, AppError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("X-Timestamp", chrono::Utc::now().timestamp_millis().to_string())
            .header("X-Nonce", nonce())
            .json(&RefreshRequest {
                account_id,
                refresh_token,
            });

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Refresh(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Refresh(format!(
                "Token refresh rejected with {}: {}",
                status, error_text
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::Refresh(format!("Failed to parse refresh response: {}", e)))?;

        parse_refresh_response(body)
    }
}

fn parse_refresh_response(body: RefreshResponse) -> Result<TokenPair, AppError> {
    if !body.success {
        return Err(AppError::Refresh(
            body.msg
                .unwrap_or_else(|| "Refresh endpoint reported failure".to_string()),
        ));
    }

    let payload = body
        .response
        .ok_or_else(|| AppError::Refresh("Refresh response has no payload".to_string()))?;

    match payload.access_token {
        Some(access_token) if !access_token.is_empty() => Ok(TokenPair {
            access_token,
            refresh_token: payload.refresh_token.filter(|t| !t.is_empty()),
        }),
        _ => Err(AppError::Refresh(
            "Refresh response has no access token".to_string(),
        )),
    }
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

//! Authenticated request coordinator.
//!
//! [`ApiClient`] attaches the stored bearer token to every call, and when the
//! server answers 401 it runs at most one refresh at a time through the
//! [`RefreshGate`]. Calls that hit a 401 while a refresh is running wait for it
//! and are replayed with the new token.

pub mod gate;
pub mod navigation;
pub mod refresh;
pub mod request;

pub use gate::{Entry, RefreshGate, RefreshLease, RefreshOutcome};
pub use navigation::{login_redirect_url, LogNavigator, Navigator, RecordingNavigator};
pub use refresh::{HttpRefreshEndpoint, RefreshEndpoint, TokenPair};
pub use request::RequestOptions;

use crate::config::ApiConfig;
use crate::credentials::{CredentialKey, CredentialStore};
use crate::error::AppError;
use crate::logging::MaskedToken;
use request::{decode_body, describe_headers, error_message, resolve_url, PreparedRequest};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_MAX_REFRESH_CYCLES: u32 = 2;

/// HTTP client with transparent single-flight token refresh
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn RefreshEndpoint>,
    navigator: Arc<dyn Navigator>,
    gate: RefreshGate,
    login_path: String,
    max_refresh_cycles: u32,
    request_timeout: Option<Duration>,
}

pub struct ApiClientBuilder {
    base_url: String,
    refresh_url: Option<String>,
    http: Option<Client>,
    store: Arc<dyn CredentialStore>,
    refresher: Option<Arc<dyn RefreshEndpoint>>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    max_refresh_cycles: u32,
    request_timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Absolute refresh URL; defaults to `<base_url>/auth/refresh-token`
    pub fn refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = Some(url.into());
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Replace the HTTP refresh endpoint (tests, alternative auth backends)
    pub fn refresh_endpoint(mut self, endpoint: Arc<dyn RefreshEndpoint>) -> Self {
        self.refresher = Some(endpoint);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn max_refresh_cycles(mut self, cycles: u32) -> Self {
        self.max_refresh_cycles = cycles.max(1);
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, AppError> {
        let http = match self.http {
            Some(client) => client,
            None => Client::builder()
                .user_agent(concat!("yt-console/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };

        let base_url = self.base_url.trim_end_matches('/').to_string();
        let refresher = match self.refresher {
            Some(endpoint) => endpoint,
            None => {
                let url = self
                    .refresh_url
                    .unwrap_or_else(|| format!("{}/auth/refresh-token", base_url));
                Arc::new(
                    HttpRefreshEndpoint::new(http.clone(), url).with_timeout(self.refresh_timeout),
                )
            }
        };

        Ok(ApiClient {
            http,
            base_url,
            store: self.store,
            refresher,
            navigator: self.navigator,
            gate: RefreshGate::new(),
            login_path: self.login_path,
            max_refresh_cycles: self.max_refresh_cycles,
            request_timeout: self.request_timeout,
        })
    }
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>, store: Arc<dyn CredentialStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            refresh_url: None,
            http: None,
            store,
            refresher: None,
            navigator: Arc::new(LogNavigator::default()),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            max_refresh_cycles: DEFAULT_MAX_REFRESH_CYCLES,
            request_timeout: None,
            refresh_timeout: None,
        }
    }

    pub fn from_config(
        config: &ApiConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        Self::builder(&config.base_url, store)
            .refresh_url(&config.refresh_url)
            .navigator(navigator)
            .login_path(&config.login_path)
            .max_refresh_cycles(config.max_refresh_cycles)
            .request_timeout(config.request_timeout())
            .refresh_timeout(config.refresh_timeout())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, AppError> {
        self.send(Method::GET, path, None, options).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.send(Method::POST, path, Some(body), options).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.send(Method::PUT, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, AppError> {
        self.send(Method::DELETE, path, None, options).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, AppError> {
        let url = resolve_url(&self.base_url, path, options.query());
        let request = PreparedRequest::new(method, url, body, options.headers())?;

        let value = if options.is_skip_auth() {
            self.dispatch_anonymous(&request).await?
        } else {
            self.dispatch(&request).await?
        };

        Ok(serde_json::from_value(value)?)
    }

    async fn dispatch_anonymous(&self, request: &PreparedRequest) -> Result<Value, AppError> {
        let response = self.transmit(request, None).await?;
        read_response(response).await
    }

    async fn dispatch(&self, request: &PreparedRequest) -> Result<Value, AppError> {
        let Some(mut token) = self.store.get(CredentialKey::AccessToken) else {
            tracing::debug!(url = %request.url, "No access token stored");
            self.redirect_to_login();
            return Err(AppError::SessionExpired);
        };

        let mut cycles = 0u32;
        loop {
            let response = self.transmit(request, Some(&token)).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return read_response(response).await;
            }

            cycles += 1;
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                token = %MaskedToken::new(&token),
                attempt = cycles,
                "Request unauthorized"
            );

            if cycles > self.max_refresh_cycles {
                tracing::warn!(
                    url = %request.url,
                    max_refresh_cycles = self.max_refresh_cycles,
                    "Token still rejected after refresh, ending session"
                );
                self.end_session();
                self.redirect_to_login();
                return Err(AppError::SessionExpired);
            }

            token = self.recover(&token).await?;
        }
    }

    /// Obtain a token newer than `rejected`, leading or following a refresh cycle
    async fn recover(&self, rejected: &str) -> Result<String, AppError> {
        loop {
            match self.gate.enter() {
                Entry::Leader(lease) => return self.lead_refresh(lease, rejected).await,
                Entry::Waiter(rx) => match rx.await {
                    Ok(RefreshOutcome::Refreshed(token)) => return Ok(token),
                    Ok(RefreshOutcome::Failed) => return Err(AppError::SessionExpired),
                    Ok(RefreshOutcome::Abandoned) | Err(_) => {
                        tracing::debug!("Refresh cycle abandoned, retrying");
                    }
                },
            }
        }
    }

    async fn lead_refresh(&self, lease: RefreshLease<'_>, rejected: &str) -> Result<String, AppError> {
        // A cycle that finished after this request was sent already rotated the token
        if let Some(current) = self.store.get(CredentialKey::AccessToken) {
            if current != rejected {
                tracing::debug!(token = %MaskedToken::new(&current), "Access token already rotated");
                lease.complete(RefreshOutcome::Refreshed(current.clone()));
                return Ok(current);
            }
        }

        let result = match (
            self.store.get(CredentialKey::AccountId),
            self.store.get(CredentialKey::RefreshToken),
        ) {
            (Some(account_id), Some(refresh_token)) => {
                tracing::info!(
                    account_id = %account_id,
                    refresh_token = %MaskedToken::new(&refresh_token),
                    "Refreshing access token"
                );
                self.refresher.refresh(&account_id, &refresh_token).await
            }
            _ => Err(AppError::Refresh(
                "No account id or refresh token stored".to_string(),
            )),
        };

        match result.and_then(|pair| self.store_tokens(&pair).map(|_| pair)) {
            Ok(pair) => {
                let woken = lease.complete(RefreshOutcome::Refreshed(pair.access_token.clone()));
                tracing::info!(
                    token = %MaskedToken::new(&pair.access_token),
                    rotated = pair.refresh_token.is_some(),
                    waiters = woken,
                    "Access token refreshed"
                );
                Ok(pair.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.end_session();
                let woken = lease.complete(RefreshOutcome::Failed);
                tracing::debug!(waiters = woken, "Rejected queued requests");
                self.redirect_to_login();
                Err(AppError::SessionExpired)
            }
        }
    }

    fn store_tokens(&self, pair: &TokenPair) -> Result<(), AppError> {
        self.store.set(CredentialKey::AccessToken, &pair.access_token)?;
        if let Some(refresh_token) = &pair.refresh_token {
            self.store.set(CredentialKey::RefreshToken, refresh_token)?;
        }
        Ok(())
    }

    fn end_session(&self) {
        for key in [CredentialKey::AccessToken, CredentialKey::AccountId] {
            if let Err(e) = self.store.clear(key) {
                tracing::error!(key = %key, error = %e, "Failed to clear credential");
            }
        }
    }

    fn redirect_to_login(&self) {
        let target = login_redirect_url(&self.login_path, &self.navigator.current_location());
        self.navigator.navigate(&target);
    }

    async fn transmit(
        &self,
        request: &PreparedRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let headers = request.headers_with_token(token)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = %describe_headers(&headers),
            "Sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(headers);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder.send().await?)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, AppError> {
    serde_json::to_value(body)
        .map_err(|e| AppError::InvalidRequest(format!("Failed to encode request body: {}", e)))
}

async fn read_response(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = error_message(status, &body);
        tracing::debug!(status = %status, message = %message, "Request failed");
        return Err(AppError::Http { status, message });
    }

    decode_body(&body)
}

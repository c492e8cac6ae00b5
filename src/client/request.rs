use crate::error::AppError;
use crate::logging::{is_sensitive_header, MaskedToken};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, PRAGMA,
};
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Per-call knobs for the client verbs
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    skip_auth: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send without credentials and without refresh handling (login, public endpoints)
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Extra header; overrides the client's defaults of the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Query parameter; empty values are dropped
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.query.push((key.into(), value));
        }
        self
    }

    /// Query parameter that is only sent when present
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn is_skip_auth(&self) -> bool {
        self.skip_auth
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Everything needed to (re)issue one call; replays reuse it with a new token
#[derive(Debug, Clone)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl PreparedRequest {
    pub fn new(
        method: Method,
        url: String,
        body: Option<Value>,
        extra_headers: &[(String, String)],
    ) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Tokens rotate; a cached 401 or 200 must never be replayed
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        for (name, value) in extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::InvalidRequest(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::InvalidRequest(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }

    /// Headers for one attempt, with the bearer token attached when given
    pub fn headers_with_token(&self, token: Option<&str>) -> Result<HeaderMap, AppError> {
        let mut headers = self.headers.clone();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::InvalidRequest("Access token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// Prefix relative paths with the base URL and append the query string
pub(crate) fn resolve_url(base_url: &str, path: &str, query: &[(String, String)]) -> String {
    let mut url = if path.starts_with("http") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    };

    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
    }

    url
}

/// Decode a 2xx body; an empty body decodes as `null`
pub(crate) fn decode_body(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Message for a non-2xx response: the JSON body's `msg` (or `message`), else the
/// status reason, else `HTTP Error: <status>`
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = || format!("HTTP Error: {}", status.as_u16());
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value
            .get("msg")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback),
        Err(_) => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(fallback),
    }
}

/// Render headers for debug logs with credentials masked
pub(crate) fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            if is_sensitive_header(name.as_str()) {
                let secret = value.strip_prefix("Bearer ").unwrap_or(value);
                format!("{}: {}", name, MaskedToken::new(secret))
            } else {
                format!("{}: {}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

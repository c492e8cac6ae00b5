//! Login, logout and session inspection on top of the credential store.

use crate::api::envelope::{string_or_number, Envelope};
use crate::client::{ApiClient, RequestOptions};
use crate::credentials::{clear_all, CredentialKey, CredentialStore, Credentials};
use crate::error::AppError;
use crate::logging::mask_secret;
use serde::{Deserialize, Serialize};

/// Login endpoint body; field names are the server's
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    eamil: &'a str,
    pass_word: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default, alias = "user_id", deserialize_with = "string_or_number")]
    account_id: String,
    #[serde(alias = "jwt_token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Authenticate and store the issued credentials.
///
/// The call bypasses the refresh machinery; a rejected login is reported with
/// the server's message.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<Credentials, AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::InvalidRequest(
            "Email and password are required".to_string(),
        ));
    }

    let envelope: Envelope<LoginPayload> = client
        .post(
            "/auth/login",
            &LoginRequest {
                eamil: email.trim(),
                pass_word: password,
            },
            RequestOptions::new().skip_auth(),
        )
        .await?;

    let success = envelope.success.unwrap_or(envelope.response.is_some());
    let message = envelope.message().map(str::to_string);
    let payload = match envelope.response {
        Some(payload) if success && !payload.access_token.is_empty() => payload,
        _ => {
            return Err(AppError::Http {
                status: reqwest::StatusCode::UNAUTHORIZED,
                message: message
                    .unwrap_or_else(|| "Login failed, check your email and password".to_string()),
            })
        }
    };

    let credentials = Credentials {
        access_token: Some(payload.access_token),
        refresh_token: payload.refresh_token.filter(|t| !t.is_empty()),
        account_id: Some(payload.account_id).filter(|id| !id.is_empty()),
    };

    let store = client.store();
    // A login without a refresh token must not keep an older one around
    if credentials.refresh_token.is_none() {
        store.clear(CredentialKey::RefreshToken)?;
    }
    credentials.save(store.as_ref())?;

    tracing::info!(account_id = ?credentials.account_id, "Logged in");
    Ok(credentials)
}

/// Forget every stored credential
pub fn logout(store: &dyn CredentialStore) -> Result<(), AppError> {
    clear_all(store)?;
    tracing::info!("Logged out");
    Ok(())
}

/// What the store currently holds, with secrets masked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub can_refresh: bool,
    pub account_id: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn session_status(store: &dyn CredentialStore) -> SessionStatus {
    let credentials = Credentials::load(store);
    SessionStatus {
        authenticated: credentials.is_authenticated(),
        can_refresh: credentials.can_refresh(),
        account_id: credentials.account_id.clone(),
        access_token: mask_secret(credentials.access_token.as_deref()),
        refresh_token: mask_secret(credentials.refresh_token.as_deref()),
    }
}

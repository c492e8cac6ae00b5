use crate::error::AppError;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};

/// Standard response wrapper used by every console endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub msg: Option<String>,
    pub response: Option<T>,
}

impl<T> Envelope<T> {
    /// Fail when the server explicitly reported `success: false`
    pub fn check(&self) -> Result<(), AppError> {
        if self.success == Some(false) {
            let status = self
                .status
                .and_then(|s| u16::try_from(s).ok())
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| !s.is_success())
                .unwrap_or(StatusCode::BAD_REQUEST);
            return Err(AppError::Http {
                status,
                message: self
                    .msg
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Request was rejected".to_string()),
            });
        }
        Ok(())
    }

    /// Payload, or an error when the call failed or carried none
    pub fn into_response(self) -> Result<T, AppError> {
        self.check()?;
        self.response.ok_or_else(|| AppError::Http {
            status: StatusCode::OK,
            message: "Response has no payload".to_string(),
        })
    }

    /// Payload, falling back to the default when absent
    pub fn into_response_or_default(self) -> Result<T, AppError>
    where
        T: Default,
    {
        self.check()?;
        Ok(self.response.unwrap_or_default())
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().filter(|m| !m.is_empty())
    }
}

/// Accept either a JSON string or number and keep its textual form
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

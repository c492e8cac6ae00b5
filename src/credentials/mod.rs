//! Credential storage behind a small capability interface.
//!
//! The client only needs `get`/`set`/`clear` over three well-known keys, so the
//! persistence backend can be swapped (in-memory for tests, JSON file for the CLI).

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys held by a credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    AccountId,
    RefreshToken,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [Self::AccessToken, Self::AccountId, Self::RefreshToken];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::AccountId => "account_id",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value capability the client reads and writes credentials through
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: CredentialKey) -> Option<String>;

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), AppError>;

    fn clear(&self, key: CredentialKey) -> Result<(), AppError>;
}

/// Snapshot of the current auth state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Credentials {
    /// Read all three keys from a store
    pub fn load(store: &dyn CredentialStore) -> Self {
        Self {
            access_token: store.get(CredentialKey::AccessToken),
            refresh_token: store.get(CredentialKey::RefreshToken),
            account_id: store.get(CredentialKey::AccountId),
        }
    }

    /// Write every present field into the store
    pub fn save(&self, store: &dyn CredentialStore) -> Result<(), AppError> {
        for key in CredentialKey::ALL {
            if let Some(value) = self.get(key) {
                store.set(key, value)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, key: CredentialKey) -> Option<&str> {
        match key {
            CredentialKey::AccessToken => self.access_token.as_deref(),
            CredentialKey::AccountId => self.account_id.as_deref(),
            CredentialKey::RefreshToken => self.refresh_token.as_deref(),
        }
    }

    fn slot(&mut self, key: CredentialKey) -> &mut Option<String> {
        match key {
            CredentialKey::AccessToken => &mut self.access_token,
            CredentialKey::AccountId => &mut self.account_id,
            CredentialKey::RefreshToken => &mut self.refresh_token,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether a refresh cycle has what it needs
    pub fn can_refresh(&self) -> bool {
        self.account_id.is_some() && self.refresh_token.is_some()
    }
}

/// Remove every credential (logout)
pub fn clear_all(store: &dyn CredentialStore) -> Result<(), AppError> {
    for key in CredentialKey::ALL {
        store.clear(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(CredentialKey::AccessToken.as_str(), "access_token");
        assert_eq!(CredentialKey::AccountId.to_string(), "account_id");
        assert_eq!(CredentialKey::RefreshToken.as_str(), "refresh_token");
    }

    #[test]
    fn test_load_and_save_roundtrip_through_store() {
        let store = MemoryCredentialStore::new();
        let creds = Credentials {
            access_token: Some("t1".to_string()),
            refresh_token: None,
            account_id: Some("42".to_string()),
        };
        creds.save(&store).unwrap();

        let loaded = Credentials::load(&store);
        assert_eq!(loaded, creds);
        assert!(loaded.is_authenticated());
        assert!(!loaded.can_refresh());
    }

    #[test]
    fn test_clear_all() {
        let store = MemoryCredentialStore::with_credentials(Credentials {
            access_token: Some("t1".to_string()),
            refresh_token: Some("r1".to_string()),
            account_id: Some("7".to_string()),
        });
        clear_all(&store).unwrap();
        assert_eq!(Credentials::load(&store), Credentials::default());
    }
}

use super::{CredentialKey, CredentialStore, Credentials};
use crate::error::AppError;
use parking_lot::RwLock;

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    pub fn snapshot(&self) -> Credentials {
        self.inner.read().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.inner.read().get(key).map(str::to_owned)
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), AppError> {
        *self.inner.write().slot(key) = Some(value.to_owned());
        Ok(())
    }

    fn clear(&self, key: CredentialKey) -> Result<(), AppError> {
        *self.inner.write().slot(key) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.get(CredentialKey::AccessToken).is_none());

        store.set(CredentialKey::AccessToken, "token-a").unwrap();
        assert_eq!(store.get(CredentialKey::AccessToken).as_deref(), Some("token-a"));

        store.set(CredentialKey::AccessToken, "token-b").unwrap();
        assert_eq!(store.get(CredentialKey::AccessToken).as_deref(), Some("token-b"));

        store.clear(CredentialKey::AccessToken).unwrap();
        assert!(store.get(CredentialKey::AccessToken).is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryCredentialStore::new();
        store.set(CredentialKey::AccountId, "42").unwrap();
        store.set(CredentialKey::RefreshToken, "r1").unwrap();
        store.clear(CredentialKey::AccountId).unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.account_id.is_none());
        assert_eq!(snapshot.refresh_token.as_deref(), Some("r1"));
    }
}

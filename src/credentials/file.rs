use super::{CredentialKey, CredentialStore, Credentials};
use crate::error::AppError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const STORAGE_VERSION: &str = "1.0";

/// Credential store persisted as a JSON file
///
/// Every mutation rewrites the whole file (write to a temp file, then rename),
/// so a crash never leaves a half-written credential file behind.
#[derive(Debug)]
pub struct FileCredentialStore {
    storage_path: PathBuf,
    credentials: RwLock<Credentials>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    version: String,
    #[serde(flatten)]
    credentials: Credentials,
}

impl FileCredentialStore {
    /// Open the store, loading existing credentials if the file exists
    pub fn open(storage_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let storage_path = storage_path.into();
        let credentials = if storage_path.exists() {
            load(&storage_path)?
        } else {
            Credentials::default()
        };

        tracing::debug!(path = %storage_path.display(), "Credential store opened");

        Ok(Self {
            storage_path,
            credentials: RwLock::new(credentials),
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn update(&self, key: CredentialKey, value: Option<&str>) -> Result<(), AppError> {
        let mut credentials = self.credentials.write();
        if credentials.get(key) == value {
            return Ok(());
        }
        let mut next = credentials.clone();
        *next.slot(key) = value.map(str::to_owned);
        save(&self.storage_path, &next)?;
        *credentials = next;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.credentials.read().get(key).map(str::to_owned)
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), AppError> {
        self.update(key, Some(value))
    }

    fn clear(&self, key: CredentialKey) -> Result<(), AppError> {
        self.update(key, None)
    }
}

fn load(path: &Path) -> Result<Credentials, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Storage(format!("Failed to read credential file: {}", e)))?;
    let file: CredentialFile = serde_json::from_str(&content)
        .map_err(|e| AppError::Storage(format!("Failed to parse credential file: {}", e)))?;

    if file.version != STORAGE_VERSION {
        return Err(AppError::Storage(format!(
            "Unsupported credential file version '{}'. Please log in again.",
            file.version
        )));
    }

    Ok(file.credentials)
}

fn save(path: &Path, credentials: &Credentials) -> Result<(), AppError> {
    let file = CredentialFile {
        version: STORAGE_VERSION.to_string(),
        credentials: credentials.clone(),
    };
    let content = serde_json::to_string_pretty(&file)
        .map_err(|e| AppError::Storage(format!("Failed to serialize credentials: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create credential directory: {}", e))
            })?;
        }
    }

    let tmp_name = format!(
        "{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, content)
        .map_err(|e| AppError::Storage(format!("Failed to write credential file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| AppError::Storage(format!("Failed to set file permissions: {}", e)))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| AppError::Storage(format!("Failed to replace credential file: {}", e)))?;
    Ok(())
}

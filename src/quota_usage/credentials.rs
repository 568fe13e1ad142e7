use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::{CredentialError, ValidationError};

/// Shortest token accepted from the user
pub const MIN_TOKEN_LENGTH: usize = 10;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "quota-bar";

/// File name holding the stored token
const TOKEN_FILE_NAME: &str = "token";

/// Storage for the opaque API token
///
/// `get` returns `Ok(None)` when nothing is stored.
pub trait CredentialProvider: Send + Sync {
    fn get(&self) -> Result<Option<String>, CredentialError>;
    fn set(&self, token: &str) -> Result<(), CredentialError>;
    fn remove(&self) -> Result<(), CredentialError>;
}

/// Check a user-entered token locally, returning the trimmed value
pub fn validate_token(token: &str) -> Result<&str, ValidationError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ValidationError::Empty);
    }
    if token.chars().count() < MIN_TOKEN_LENGTH {
        return Err(ValidationError::TooShort {
            min: MIN_TOKEN_LENGTH,
        });
    }
    Ok(token)
}

/// Token kept in a single owner-only file
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/quota-bar/token`
    pub fn default_location() -> Result<Self, CredentialError> {
        let config_dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(config_dir.join(APP_DIR_NAME).join(TOKEN_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialProvider for FileCredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        if !self.path.exists() {
            log::trace!("No token file at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let token = content.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            // New files are created owner-only; the mode only applies on creation
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
            file.write_all(token.as_bytes())?;
        }

        #[cfg(not(unix))]
        fs::write(&self.path, token)?;

        log::debug!("Stored API token at {}", self.path.display());
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process token store
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialProvider for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        let token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        Ok(token.clone().filter(|t| !t.trim().is_empty()))
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

//! Persistent storage for the session token
//!
//! The bearer token is the only client-side state that survives between
//! invocations. It is held as a [`SecretString`] in memory and written to one
//! of three backends:
//! - `KeyringTokenStore`: OS-native secure storage (primary)
//! - `FileTokenStore`: a 0600 plain file (fallback for headless systems)
//! - `MemoryTokenStore`: process memory only (tests, ephemeral runs)

use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::{SessionConfig, TokenStorage};
use crate::error::{CredentialError, Result};

const KEYRING_SERVICE: &str = "creatorcast.session";
const KEYRING_USER: &str = "token";

/// Storage backend for the session token
pub trait TokenStore: Send + Sync {
    /// Load the stored token, `None` when nothing is stored
    fn load(&self) -> Result<Option<SecretString>>;

    /// Replace the stored token
    fn save(&self, token: &SecretString) -> Result<()>;

    /// Remove the stored token; removing nothing is not an error
    fn clear(&self) -> Result<()>;

    fn backend_name(&self) -> &str;
}

/// Build the configured token store
///
/// When the keyring is selected but unavailable, falls back to the token file
/// and logs a warning.
pub fn open_token_store(config: &SessionConfig) -> Box<dyn TokenStore> {
    let token_file = PathBuf::from(shellexpand::tilde(&config.token_file).to_string());

    match config.storage {
        TokenStorage::Keyring => match KeyringTokenStore::new() {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(
                    "{}. Falling back to token file at {}",
                    e,
                    token_file.display()
                );
                Box::new(FileTokenStore::new(token_file))
            }
        },
        TokenStorage::File => Box::new(FileTokenStore::new(token_file)),
        TokenStorage::Memory => Box::new(MemoryTokenStore::new()),
    }
}

pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

impl KeyringTokenStore {
    /// # Errors
    ///
    /// Returns `CredentialError::KeyringUnavailable` if the OS keyring
    /// cannot be accessed (e.g., headless Linux without Secret Service).
    pub fn new() -> Result<Self> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .map_err(|e| CredentialError::KeyringUnavailable(e.to_string()))?;

        // Probe: a missing entry is fine, an unreachable backend is not
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(Self { entry }),
            Err(e) => Err(CredentialError::KeyringUnavailable(e.to_string()).into()),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Keyring(e.to_string()).into()),
        }
    }

    fn save(&self, token: &SecretString) -> Result<()> {
        self.entry
            .set_password(token.expose_secret())
            .map_err(|e| CredentialError::Keyring(e.to_string()))?;

        tracing::debug!("Stored session token in OS keyring");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keyring(e.to_string()).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SecretString::from(token.to_string())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::Io(e).into()),
        }
    }

    fn save(&self, token: &SecretString) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(CredentialError::Io)?;
        }

        std::fs::write(&self.path, token.expose_secret()).map_err(CredentialError::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(CredentialError::Io)?;
        }

        tracing::debug!("Stored session token in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::Io(e).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a token, as if a previous run had logged in
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.lock().map(|t| t.is_none()).unwrap_or(true)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>> {
        let token = self
            .token
            .lock()
            .map_err(|_| CredentialError::Keyring("token store lock poisoned".to_string()))?;
        Ok(token.clone().map(SecretString::from))
    }

    fn save(&self, token: &SecretString) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| CredentialError::Keyring("token store lock poisoned".to_string()))?;
        *slot = Some(token.expose_secret().to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| CredentialError::Keyring("token store lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<SecretString>> {
        (**self).load()
    }

    fn save(&self, token: &SecretString) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}

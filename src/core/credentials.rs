use std::error::Error;
use std::fmt;
use std::sync::Mutex;

use keyring::Entry;

use crate::api::models::AuthTokens;

const KEYRING_SERVICE: &str = "kindred";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Describes failures when reading or writing persisted credentials.
///
/// Recoverable errors indicate that the credential backend was temporarily
/// unavailable (for example a locked keychain). Permanent errors surface the
/// underlying cause so callers can report it.
#[derive(Debug)]
pub enum CredentialError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl CredentialError {
    fn inner(&self) -> &keyring::Error {
        match self {
            CredentialError::Recoverable(err) | CredentialError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, CredentialError::Recoverable(_))
    }
}

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                CredentialError::Recoverable(err)
            }
            other => CredentialError::Permanent(other),
        }
    }
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credential storage: {}", self.inner())
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// The persisted credential pair. Either half may be missing when a previous
/// write was interrupted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl From<&AuthTokens> for StoredCredentials {
    fn from(tokens: &AuthTokens) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
        }
    }
}

/// Durable home of the access/refresh credential pair.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<StoredCredentials, CredentialError>;
    fn store(&self, credentials: &StoredCredentials) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Separate keyring namespace, used to keep several API endpoints apart.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn read(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), CredentialError> {
        let entry = Entry::new(&self.service, key)?;
        match value {
            Some(value) => entry.set_password(value).map_err(CredentialError::from),
            None => match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<StoredCredentials, CredentialError> {
        Ok(StoredCredentials {
            access_token: self.read(ACCESS_TOKEN_KEY)?,
            refresh_token: self.read(REFRESH_TOKEN_KEY)?,
        })
    }

    fn store(&self, credentials: &StoredCredentials) -> Result<(), CredentialError> {
        self.write(ACCESS_TOKEN_KEY, credentials.access_token.as_deref())?;
        self.write(REFRESH_TOKEN_KEY, credentials.refresh_token.as_deref())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.write(ACCESS_TOKEN_KEY, None)?;
        self.write(REFRESH_TOKEN_KEY, None)
    }
}

/// In-process credential store for tests and `--no-keyring` runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            inner: Mutex::new(StoredCredentials {
                access_token: Some(access.to_string()),
                refresh_token: Some(refresh.to_string()),
            }),
        }
    }

    pub fn snapshot(&self) -> StoredCredentials {
        self.inner.lock().unwrap().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<StoredCredentials, CredentialError> {
        Ok(self.snapshot())
    }

    fn store(&self, credentials: &StoredCredentials) -> Result<(), CredentialError> {
        *self.inner.lock().unwrap() = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.inner.lock().unwrap() = StoredCredentials::default();
        Ok(())
    }
}

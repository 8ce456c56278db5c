//! Pluggable token storage scopes.
//!
//! Two scopes back the credential store: a durable one that survives
//! restarts and a session one that lives only as long as the process. Which
//! scope holds the access token is decided by the remember-me choice at
//! sign-in; the refresh token always goes to the durable scope.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use keyring::Entry;

/// Storage key for the bearer token attached to requests
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the long-lived token used to mint new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// A named key-value store holding authentication tokens.
///
/// Implementations decide durability: [`FileScope`] survives restarts,
/// [`MemoryScope`] is wiped with the process, [`KeyringScope`] delegates to
/// the OS keychain. Removing an absent key is not an error.
pub trait TokenScope: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// FileScope
// ============================================================================

/// Credential file name in the config directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Durable scope persisting tokens as a JSON object on disk.
///
/// The file is created with mode 0600 on unix so tokens stay readable only
/// by the owning user. It is deleted outright once the last key is removed.
pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(CREDENTIALS_FILE),
        }
    }

    /// Scope rooted at the per-user config directory.
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(Self::new(config_dir.join(crate::config::APP_NAME)))
    }

    fn read_map(&self) -> HashMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create credential directory")?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents).context("Failed to write credential file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .context("Failed to restrict credential file permissions")?;
        }

        Ok(())
    }
}

impl TokenScope for FileScope {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map();
        if map.remove(key).is_none() {
            return Ok(());
        }
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove credential file")?;
            }
            Ok(())
        } else {
            self.write_map(&map)
        }
    }
}

// ============================================================================
// MemoryScope
// ============================================================================

/// Session scope holding tokens in process memory only.
#[derive(Default)]
pub struct MemoryScope {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenScope for MemoryScope {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// KeyringScope
// ============================================================================

/// Service name registered with the OS keychain
const SERVICE_NAME: &str = "lectern";

/// Durable scope backed by the OS keychain.
///
/// An alternative to [`FileScope`] for installs where tokens should not sit
/// on disk in plain text.
pub struct KeyringScope {
    service: String,
}

impl KeyringScope {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Use a custom keychain service name, for side-by-side installs.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenScope for KeyringScope {
    fn get(&self, key: &str) -> Option<String> {
        let entry = Entry::new(&self.service, key).ok()?;
        entry.get_password().ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lectern-scope-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_memory_scope_set_get_remove() {
        let scope = MemoryScope::new();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY), None);

        scope.set(ACCESS_TOKEN_KEY, "tok-1").unwrap();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-1"));

        scope.set(ACCESS_TOKEN_KEY, "tok-2").unwrap();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-2"));

        scope.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY), None);

        // Removing again is fine
        scope.remove(ACCESS_TOKEN_KEY).unwrap();
    }

    #[test]
    fn test_file_scope_round_trip() {
        let dir = scratch_dir("round-trip");
        let scope = FileScope::new(dir.clone());

        assert_eq!(scope.get(ACCESS_TOKEN_KEY), None);

        scope.set(ACCESS_TOKEN_KEY, "tok-1").unwrap();
        scope.set(REFRESH_TOKEN_KEY, "ref-1").unwrap();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-1"));
        assert_eq!(scope.get(REFRESH_TOKEN_KEY).as_deref(), Some("ref-1"));

        // A second scope over the same directory sees the persisted values
        let reopened = FileScope::new(dir.clone());
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-1"));

        scope.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(scope.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(scope.get(REFRESH_TOKEN_KEY).as_deref(), Some("ref-1"));

        // Removing the last key deletes the file
        scope.remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(!dir.join(CREDENTIALS_FILE).exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_scope_remove_missing_key_is_noop() {
        let dir = scratch_dir("remove-missing");
        let scope = FileScope::new(dir.clone());
        scope.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(!dir.join(CREDENTIALS_FILE).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_scope_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir("perms");
        let scope = FileScope::new(dir.clone());
        scope.set(ACCESS_TOKEN_KEY, "tok-1").unwrap();

        let mode = std::fs::metadata(dir.join(CREDENTIALS_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = std::fs::remove_dir_all(dir);
    }
}

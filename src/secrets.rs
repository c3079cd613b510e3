// src/secrets.rs
// Token storage for the Intelink client
// Stores the access/refresh token pair in a local JSON file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================
// Internal Types (Private)
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
struct StoredTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

// ============================================
// Public API
// ============================================

/// Persistent storage for the session's token pair
///
/// The file holds two string keys, `accessToken` and `refreshToken`.
/// Reads are served from memory; every write goes to disk immediately.
pub struct TokenStore {
    path: PathBuf,
    tokens: StoredTokens,
}

impl TokenStore {
    /// Open the store in a data root
    ///
    /// Loads existing tokens if available, or initializes an empty store.
    pub fn open(data_root: &Path) -> Self {
        let path = credentials_file_path(data_root);
        let tokens = load_tokens_from_file(&path).unwrap_or_default();
        Self { path, tokens }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the access token
    pub fn access_token(&self) -> Option<String> {
        self.tokens.access_token.clone()
    }

    /// Get the refresh token
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token.clone()
    }

    pub fn has_tokens(&self) -> bool {
        self.tokens.access_token.is_some()
    }

    /// Store both tokens
    pub fn store(&mut self, access_token: String, refresh_token: Option<String>) -> Result<()> {
        self.tokens = StoredTokens {
            access_token: Some(access_token),
            refresh_token,
        };
        save_tokens_to_file(&self.path, &self.tokens)
    }

    /// Delete stored tokens
    ///
    /// Removes the file and clears in-memory state.
    pub fn clear(&mut self) -> Result<()> {
        self.tokens = StoredTokens::default();
        delete_tokens_file(&self.path)
    }
}

// ============================================
// Internal Implementation
// ============================================

fn credentials_file_path(data_root: &Path) -> PathBuf {
    data_root.join("session").join("credentials.json")
}

fn load_tokens_from_file(path: &Path) -> Result<StoredTokens> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tokens from {}", path.display()))?;
    let tokens: StoredTokens = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tokens from {}", path.display()))?;
    Ok(tokens)
}

fn save_tokens_to_file(path: &Path, tokens: &StoredTokens) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

    fs::write(path, json)
        .with_context(|| format!("Failed to write tokens to {}", path.display()))?;

    restrict_permissions(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn delete_tokens_file(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to delete tokens file {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path());
        assert!(!store.has_tokens());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_store_persists_under_two_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TokenStore::open(dir.path());
        store
            .store("access-1".to_string(), Some("refresh-1".to_string()))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["accessToken"], "access-1");
        assert_eq!(raw["refreshToken"], "refresh-1");

        let reopened = TokenStore::open(dir.path());
        assert_eq!(reopened.access_token().as_deref(), Some("access-1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TokenStore::open(dir.path());
        store.store("a".to_string(), None).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(!store.has_tokens());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = credentials_file_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let store = TokenStore::open(dir.path());
        assert!(!store.has_tokens());
    }
}

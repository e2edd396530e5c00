//! Model API key storage.
//!
//! Resolution order: a key supplied explicitly by the caller, then the key
//! file under the data directory, then the environment.

use crate::domain::errors::CredentialError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const KEY_FILE_NAME: &str = "openai_api_key.txt";
pub const KEY_PREFIX: &str = "sk-";

pub struct CredentialStore {
    key_file: PathBuf,
    explicit: Option<String>,
    env_key: Option<String>,
}

impl CredentialStore {
    pub fn new(data_dir: &Path, explicit: Option<String>, env_key: Option<String>) -> Self {
        Self {
            key_file: data_dir.join(KEY_FILE_NAME),
            explicit: non_blank(explicit),
            env_key: non_blank(env_key),
        }
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    pub fn resolve(&self) -> Option<String> {
        if let Some(key) = &self.explicit {
            return Some(key.clone());
        }
        if let Some(key) = self.read_key_file() {
            debug!("CredentialStore: Using key from {:?}", self.key_file);
            return Some(key);
        }
        self.env_key.clone()
    }

    /// Persists a trimmed key and makes it the explicit key for this store.
    pub fn save(&mut self, key: &str) -> Result<(), CredentialError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialError::InvalidFormat);
        }

        let storage = |e: std::io::Error| CredentialError::Storage {
            reason: e.to_string(),
        };
        if let Some(dir) = self.key_file.parent() {
            fs::create_dir_all(dir).map_err(storage)?;
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.key_file.with_extension("tmp");
        fs::write(&temp_path, key).map_err(storage)?;
        fs::rename(&temp_path, &self.key_file).map_err(storage)?;

        self.explicit = Some(key.to_string());
        info!("CredentialStore: Saved API key to {:?}", self.key_file);
        Ok(())
    }

    fn read_key_file(&self) -> Option<String> {
        match fs::read_to_string(&self.key_file) {
            Ok(content) => non_blank(Some(content)),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("CredentialStore: Cannot read {:?}: {}", self.key_file, e);
                }
                None
            }
        }
    }
}

/// Local format check run before any network validation.
pub fn precheck_key(key: &str) -> Result<&str, CredentialError> {
    let key = key.trim();
    if key.is_empty() || !key.starts_with(KEY_PREFIX) {
        return Err(CredentialError::InvalidFormat);
    }
    Ok(key)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolution_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(KEY_FILE_NAME), "  sk-file\n").unwrap();

        let explicit = CredentialStore::new(
            dir.path(),
            Some("sk-explicit".to_string()),
            Some("sk-env".to_string()),
        );
        assert_eq!(explicit.resolve().as_deref(), Some("sk-explicit"));

        let from_file = CredentialStore::new(dir.path(), None, Some("sk-env".to_string()));
        assert_eq!(from_file.resolve().as_deref(), Some("sk-file"));

        let empty_dir = TempDir::new().unwrap();
        let from_env = CredentialStore::new(empty_dir.path(), Some("  ".to_string()), Some("sk-env".to_string()));
        assert_eq!(from_env.resolve().as_deref(), Some("sk-env"));

        let none = CredentialStore::new(empty_dir.path(), None, None);
        assert_eq!(none.resolve(), None);
    }

    #[test]
    fn test_save_trims_and_creates_dir() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested");
        let mut store = CredentialStore::new(&data_dir, None, None);

        store.save("  sk-saved \n").unwrap();

        assert_eq!(fs::read_to_string(store.key_file()).unwrap(), "sk-saved");
        assert_eq!(store.resolve().as_deref(), Some("sk-saved"));
        assert_eq!(store.save("   "), Err(CredentialError::InvalidFormat));
    }

    #[test]
    fn test_precheck_key() {
        assert_eq!(precheck_key(" sk-abc "), Ok("sk-abc"));
        assert_eq!(precheck_key(""), Err(CredentialError::InvalidFormat));
        assert_eq!(precheck_key("pk-abc"), Err(CredentialError::InvalidFormat));
    }
}

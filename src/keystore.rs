use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_RETENTION_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("failed to read key store {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key store {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse key store {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKey {
    pub api_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Durable storage for the API key between runs.
#[derive(Clone, Debug)]
pub struct KeyStore {
    path: PathBuf,
    retention: Duration,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn read_entry(&self) -> Result<Option<StoredKey>, KeyStoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(KeyStoreError::Read {
                    path: self.display_path(),
                    source,
                })
            }
        };
        serde_yaml::from_str::<StoredKey>(&contents)
            .map(Some)
            .map_err(|source| KeyStoreError::Parse {
                path: self.display_path(),
                source,
            })
    }

    /// The stored key, unless it is missing, blank or expired.
    pub fn load(&self) -> Result<Option<String>, KeyStoreError> {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Option<String>, KeyStoreError> {
        Ok(self
            .read_entry()?
            .filter(|entry| entry.expires_at > now && !entry.api_key.trim().is_empty())
            .map(|entry| entry.api_key))
    }

    pub fn save(&self, api_key: &str) -> Result<StoredKey, KeyStoreError> {
        self.save_at(api_key, Utc::now())
    }

    pub fn save_at(&self, api_key: &str, now: DateTime<Utc>) -> Result<StoredKey, KeyStoreError> {
        let entry = StoredKey {
            api_key: api_key.to_string(),
            expires_at: now + self.retention,
        };
        let write_err = |source| KeyStoreError::Write {
            path: self.display_path(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_yaml::to_string(&entry).map_err(|source| KeyStoreError::Parse {
            path: self.display_path(),
            source,
        })?;
        let mut file = open_private(&self.path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        Ok(entry)
    }

    pub fn clear(&self) -> Result<bool, KeyStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(KeyStoreError::Write {
                path: self.display_path(),
                source,
            }),
        }
    }
}

/// Opens the store for writing, owner-only from the moment it exists.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a file left by an older run.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_store_has_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("credentials.yml"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("nested").join("credentials.yml"));
        let entry = store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));
        assert!(entry.expires_at > Utc::now() + Duration::days(364));
        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn expired_key_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("credentials.yml"));
        let now = Utc::now();
        store.save_at("old", now - Duration::days(400)).unwrap();
        assert_eq!(store.load_at(now).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("credentials.yml"));
        store.save("k").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_private_before_any_bytes_land() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.yml");
        let file = open_private(&path).unwrap();
        let mode = file.metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(file.metadata().unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_existing_readable_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.yml");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = KeyStore::new(&path);
        store.save("k").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().as_deref(), Some("k"));
    }
}

//! Infrastructure implementation of the `StateStore` port.
//!
//! `FileStateStore` keeps one JSON file per key under
//! `<work_dir>/.test-data/`. Blocking file I/O runs on
//! `tokio::task::spawn_blocking`, and writes are atomic (temp file + rename).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tfcheck_common::{TEST_DATA_DIR, validate_state_key};
use tracing::debug;

use crate::application::ports::StateStore;
use crate::domain::error::PersistenceError;

/// State files for one working directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Store scoped to `work_dir`, e.g. the Terraform working copy.
    #[must_use]
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: work_dir.as_ref().join(TEST_DATA_DIR),
        }
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid state key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_state_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    // Key pairs include private key material.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing state file {}", path.display()))
}

async fn blocking<T, F>(what: &'static str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .with_context(|| format!("state {what} task panicked"))?
}

impl StateStore for FileStateStore {
    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key)?;
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("serializing state '{key}'"))?;
        debug!(key, path = %path.display(), "saving state");
        blocking("save", move || write_atomic(&path, &content)).await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.path_for(key)?;
        let read_path = path.clone();
        let content = blocking("load", move || {
            if !read_path.exists() {
                return Ok(None);
            }
            std::fs::read_to_string(&read_path)
                .map(Some)
                .with_context(|| format!("reading state file {}", read_path.display()))
        })
        .await?;
        let Some(content) = content else {
            return Err(PersistenceError::Missing {
                key: key.to_string(),
                path,
            }
            .into());
        };
        serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", path.display()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        blocking("exists", move || Ok(path.exists())).await
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        blocking("clear", move || {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("removing state file {}", path.display()))?;
            }
            Ok(())
        })
        .await
    }

    async fn clean(&self) -> Result<()> {
        let dir = self.dir.clone();
        debug!(dir = %dir.display(), "removing state directory");
        blocking("clean", move || {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)
                    .with_context(|| format!("removing {}", dir.display()))?;
            }
            Ok(())
        })
        .await
    }
}

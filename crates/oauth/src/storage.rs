use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    serde_json::{Map, Value},
    tokio::{
        io::AsyncWriteExt,
        sync::{Mutex, RwLock},
    },
    tracing::{debug, info, warn},
};

use crate::{Result, error::Context};

/// Key the access token is stored under.
pub const TOKEN_STORE_KEY: &str = "bolcom_token";

/// Opaque key-value persistence for the token manager.
///
/// Implementations only need read-your-writes for a single owner.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// File-based store: one JSON object keyed by store key, written with mode
/// `0600` on Unix.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/credentials.json`, or `.config/bol-mcp/credentials.json`
    /// when no home directory can be resolved.
    pub fn default_path() -> PathBuf {
        bolmcp_config::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config/bol-mcp"))
            .join("credentials.json")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_map(&self) -> Map<String, Value> {
        let path = self.path.display().to_string();
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path, "credential file not found");
                return Map::new();
            },
            Err(e) => {
                warn!(path = %path, error = %e, "credential file read failed");
                return Map::new();
            },
        };

        match serde_json::from_str::<Map<String, Value>>(&data) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %path, error = %e, "credential file parse failed");
                Map::new()
            },
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_map().await.remove(key))
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.display().to_string();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut map = self.read_map().await;
        map.insert(key.to_string(), value);
        let data = serde_json::to_string_pretty(&map)?;

        // Write next to the target and rename so a crash never leaves a
        // half-written file behind.
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, data.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {path}"))?;

        info!(path = %path, key, "credential store updated");
        Ok(())
    }
}

/// Write `data` to a fresh file that only the owner can read.
///
/// A leftover file from an interrupted write is removed first; `mode` only
/// applies when the file is created.
async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {},
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => return Err(e),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// In-process store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

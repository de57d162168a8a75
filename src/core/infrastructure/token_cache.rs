//! File-backed cache of session tokens, keyed by server host.

use crate::{
    ZabbixError, ZabbixResult, ZabbixToken,
    core::domain::value_object::{serde_helpers::system_time, validate_token},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const DEFAULT_CACHE_FILE: &str = "zabbix.cache";

/// Storage for session tokens, one per server host.
///
/// Implementations must treat unreadable content as a miss: a broken cache
/// costs a login, never a failed startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the token stored for `key`, if there is a usable one.
    async fn get(&self, key: &str) -> Option<ZabbixToken>;

    /// Stores `token` under `key`, replacing any previous token.
    async fn write(&self, key: &str, token: &ZabbixToken) -> ZabbixResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    token: String,
    #[serde(with = "system_time")]
    saved_at: SystemTime,
}

/// A [`TokenStore`] persisted as one JSON object in a single file.
///
/// Writers replace the file atomically (temporary file, then rename), so a
/// reader sees either the old or the new map. Concurrent writers from several
/// processes are not coordinated: the last rename wins.
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$TMPDIR/zabbix.cache`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw map. Missing or malformed files read as empty.
    async fn load(&self) -> Map<String, Value> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token cache file yet");
                return Map::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read token cache");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %self.path.display(), "Token cache is not a JSON object, ignoring it");
                Map::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt token cache, ignoring it");
                Map::new()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CACHE_FILE.to_string());
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos())
            .unwrap_or_default();
        self.path.with_file_name(format!(
            ".{}.{}.{:09}.tmp",
            file_name,
            std::process::id(),
            nanos
        ))
    }

    async fn store(&self, map: &Map<String, Value>) -> std::io::Result<()> {
        let data = serde_json::to_string_pretty(map)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.temp_path();
        let mut file = create_private(&tmp_path).await?;

        let written = async {
            file.write_all(data.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

/// Creates a new file readable only by the owner. Fails if anything,
/// including a symlink, already exists at `path`.
async fn create_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

impl Default for FileTokenCache {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl TokenStore for FileTokenCache {
    async fn get(&self, key: &str) -> Option<ZabbixToken> {
        let mut map = self.load().await;
        let raw = map.remove(key)?;

        let entry: CacheEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(host = key, error = %e, "Malformed token cache entry, ignoring it");
                return None;
            }
        };

        if let Err(e) = validate_token(&entry.token) {
            warn!(host = key, error = %e, "Cached token is unusable, ignoring it");
            return None;
        }

        let age = entry.saved_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
        debug!(host = key, age_secs = age, "Token cache hit");
        Some(ZabbixToken::new_unchecked(entry.token))
    }

    async fn write(&self, key: &str, token: &ZabbixToken) -> ZabbixResult<()> {
        let mut map = self.load().await;
        let entry = CacheEntry {
            token: token.as_str().to_string(),
            saved_at: SystemTime::now(),
        };
        let value = serde_json::to_value(&entry).map_err(|e| ZabbixError::Cache(e.to_string()))?;
        map.insert(key.to_string(), value);

        self.store(&map).await.map_err(|e| {
            ZabbixError::Cache(format!("Cannot write {}: {}", self.path.display(), e))
        })?;
        debug!(host = key, path = %self.path.display(), "Token cached");
        Ok(())
    }
}

//! On-disk response cache. Entries are JSON files holding the value and an
//! expiry timestamp; expired entries are evicted lazily when read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,
    #[error("cache entry expired")]
    Expired,
    #[error("cache disabled")]
    Disabled,
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    value: serde_json::Value,
    /// Unix seconds; 0 never expires.
    expires_at: i64,
}

impl Entry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at != 0 && now >= self.expires_at
    }
}

pub struct Cache {
    dir: PathBuf,
    enabled: bool,
    lock: RwLock<()>,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
            lock: RwLock::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for `namespace:operation:json(params)`.
    pub fn key<P: Serialize + ?Sized>(namespace: &str, operation: &str, params: &P) -> String {
        let params = serde_json::to_string(params).unwrap_or_default();
        format!("{:016x}", fnv1a(format!("{namespace}:{operation}:{params}").as_bytes()))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        if !self.enabled {
            return Err(CacheError::Disabled);
        }
        let path = self.entry_path(key);
        let entry: Entry = {
            let _guard = self.lock.read().await;
            let bytes = match tokio::fs::read(&path).await {
                Ok(b) => b,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CacheError::Miss)
                }
                Err(e) => return Err(e.into()),
            };
            serde_json::from_slice(&bytes)?
        };

        if entry.is_expired(chrono::Utc::now().timestamp()) {
            let _guard = self.lock.write().await;
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("cache: failed to evict {}: {}", path.display(), e);
                }
            }
            return Err(CacheError::Expired);
        }
        Ok(serde_json::from_value(entry.value)?)
    }

    /// Store `value`; a zero `ttl` never expires.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if !self.enabled {
            return Err(CacheError::Disabled);
        }
        let expires_at = if ttl.is_zero() {
            0
        } else {
            chrono::Utc::now().timestamp() + ttl.as_secs().max(1) as i64
        };
        let entry = Entry {
            value: serde_json::to_value(value)?,
            expires_at,
        };
        let bytes = serde_json::to_vec(&entry)?;

        let _guard = self.lock.write().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.entry_path(key), bytes).await?;
        Ok(())
    }

    /// Returns the cached value for `key`, or runs `fetch`, stores its result
    /// and returns it. Cache failures never fail the fetch.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        match self.get::<T>(key).await {
            Ok(v) => {
                debug!("cache: hit {}", key);
                return Ok(v);
            }
            Err(CacheError::Miss | CacheError::Expired | CacheError::Disabled) => {}
            Err(e) => warn!("cache: read {} failed: {}", key, e),
        }
        let value = fetch().await?;
        match self.set(key, &value, ttl).await {
            Ok(()) | Err(CacheError::Disabled) => {}
            Err(e) => warn!("cache: write {} failed: {}", key, e),
        }
        Ok(value)
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.lock.write().await;
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(path).await?;
            }
        }
        Ok(())
    }
}

/// 64-bit FNV-1a. File names must stay stable across builds.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(PRIME))
}

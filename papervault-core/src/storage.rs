use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

use crate::cache::{OutlineCacheKey, OutlineCacheValue};

/// Storage abstraction for cached outlines
pub trait OutlineStorage {
    fn get_outline(&self, key: &OutlineCacheKey) -> Result<Option<OutlineCacheValue>>;
    fn store_outline(&self, key: &OutlineCacheKey, value: &OutlineCacheValue) -> Result<()>;
}

/// File-based storage implementation using a local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        // Ensure cache directory exists
        fs::create_dir_all(format!("{cache_dir}/outlines"))?;
        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn outline_path(&self, key: &OutlineCacheKey) -> String {
        format!("{}/outlines/{}.json", self.cache_dir, key.to_cache_hash())
    }
}

impl OutlineStorage for FileStorage {
    fn get_outline(&self, key: &OutlineCacheKey) -> Result<Option<OutlineCacheValue>> {
        let path = self.outline_path(key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let value: OutlineCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached outline: {}", e))?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    fn store_outline(&self, key: &OutlineCacheKey, value: &OutlineCacheValue) -> Result<()> {
        let path = self.outline_path(key);
        let json_str = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow!("Failed to serialize outline for caching: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables outline caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl OutlineStorage for NoOpStorage {
    fn get_outline(&self, _key: &OutlineCacheKey) -> Result<Option<OutlineCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_outline(&self, _key: &OutlineCacheKey, _value: &OutlineCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

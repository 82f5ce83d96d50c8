use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Outline;

/// Version constants for cache invalidation
pub mod versions {
    pub const PAPERVAULT_VERSION: &str = "0.1.0";
    pub const OUTLINE_VERSION: &str = "1.0.0";
}

/// Cache key for generated outlines (PDF + Config → Outline).
/// The outline costs one architect call per page batch, so it is what
/// gets cached across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OutlineCacheKey {
    pub pdf_hash: String,
    pub config_hash: String,
    pub papervault_version: String,
    pub outline_version: String,
}

impl OutlineCacheKey {
    pub fn new(pdf_hash: String, config_hash: String) -> Self {
        Self {
            pdf_hash,
            config_hash,
            papervault_version: versions::PAPERVAULT_VERSION.to_string(),
            outline_version: versions::OUTLINE_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.pdf_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.papervault_version);
        hasher.update(&self.outline_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached outline with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineCacheValue {
    pub outline: Outline,
    pub created_at: DateTime<Utc>,
    /// Model that generated the outline, for the cache-hit log line.
    pub model: String,
}

impl OutlineCacheValue {
    pub fn new(outline: Outline, model: String) -> Self {
        Self {
            outline,
            created_at: Utc::now(),
            model,
        }
    }
}

/// Calculate a fast hash for PDF content using start + end chunks
pub fn calculate_pdf_hash(pdf_bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let chunk_size = 1024; // 1KB from start and end
    let mut hasher = Sha256::new();

    // Hash file size first (for quick differentiation)
    hasher.update(pdf_bytes.len().to_le_bytes());

    // Hash first chunk
    let start_end = std::cmp::min(chunk_size, pdf_bytes.len());
    hasher.update(&pdf_bytes[0..start_end]);

    // Hash last chunk (if file is large enough)
    if pdf_bytes.len() > chunk_size {
        let end_start = pdf_bytes.len() - chunk_size;
        hasher.update(&pdf_bytes[end_start..]);
    }

    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (for the cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> anyhow::Result<String> {
    use sha2::{Digest, Sha256};
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

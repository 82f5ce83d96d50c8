use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

// Default value functions for serde
fn default_architect_model() -> String {
    "qwen/qwen3-vl-235b-a22b-instruct".to_string()
}

fn default_analyst_model() -> String {
    "qwen/qwen3-vl-235b-a22b-instruct".to_string()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_pages_per_batch() -> usize {
    3 // 2-4 pages per architect batch works well
}

fn default_render_dpi() -> f32 {
    300.0
}

fn default_min_length() -> usize {
    600
}

fn default_max_length() -> usize {
    3500
}

fn default_max_attempts() -> usize {
    3
}

fn default_transport_retries() -> usize {
    15
}

fn default_base_delay_secs() -> u64 {
    2
}

fn default_throttle_ms() -> u64 {
    1500
}

/// Top-level analysis configuration. Every field has a serde default so a
/// config file only needs to state what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Model used for outline generation.
    #[serde(default = "default_architect_model")]
    pub architect_model: String,
    /// Model used for section deep-dives (must accept images).
    #[serde(default = "default_analyst_model")]
    pub analyst_model: String,
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Pages of extracted text fed to the architect per batch.
    #[serde(default = "default_pages_per_batch")]
    pub pages_per_batch: usize,
    /// DPI for page images sent to the analyst model.
    #[serde(default = "default_render_dpi")]
    pub render_dpi: f32,
    /// Analyze the appendix too (skipped by default).
    #[serde(default)]
    pub include_appendix: bool,
    /// Content quality gate configuration.
    #[serde(default)]
    pub quality: QualityGateConfig,
    /// Retry behavior, both content-level and transport-level.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Acceptance band for the post-generation quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateConfig {
    /// Minimum content length in non-whitespace characters.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Maximum content length in non-whitespace characters.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Generation attempts per sub-question (re-prompts on bad length).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Transport-level retries inside the API client (rate limits, 5xx).
    #[serde(default = "default_transport_retries")]
    pub transport_retries: usize,
    /// Base for the exponential backoff schedule, in seconds.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    /// Flat pre-call delay to stay under provider rate limits.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            transport_retries: default_transport_retries(),
            base_delay_secs: default_base_delay_secs(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            architect_model: default_architect_model(),
            analyst_model: default_analyst_model(),
            base_url: default_base_url(),
            pages_per_batch: default_pages_per_batch(),
            render_dpi: default_render_dpi(),
            include_appendix: false,
            quality: QualityGateConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|_| {
                eprintln!("⚠️  Failed to load config from {}, using defaults", p);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LabelerError, Result};
use crate::models::JobCategory;
use crate::phrases::{default_interview_phrases, default_rejection_phrases};

/// Longest retention window accepted (ten years)
pub const MAX_RETENTION_DAYS: u32 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub phrases: PhrasesConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Only messages newer than this many days are scanned
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "default_rejection_label")]
    pub rejection: String,
    #[serde(default = "default_interview_label")]
    pub interview: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            rejection: default_rejection_label(),
            interview: default_interview_label(),
        }
    }
}

impl LabelConfig {
    pub fn name_for(&self, category: JobCategory) -> &str {
        match category {
            JobCategory::Rejection => &self.rejection,
            JobCategory::Interview => &self.interview,
        }
    }
}

/// Optional replacements for the built-in phrase lists
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhrasesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview: Option<Vec<String>>,
}

impl PhrasesConfig {
    pub fn rejection_phrases(&self) -> Vec<String> {
        self.rejection
            .clone()
            .unwrap_or_else(default_rejection_phrases)
    }

    pub fn interview_phrases(&self) -> Vec<String> {
        self.interview
            .clone()
            .unwrap_or_else(default_interview_phrases)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Walk the whole MIME tree instead of only the payload's direct children
    #[serde(default = "default_recurse_nested_parts")]
    pub recurse_nested_parts: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            recurse_nested_parts: default_recurse_nested_parts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub dry_run: bool,
}

fn default_retention_days() -> u32 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_rejection_label() -> String {
    "Unfortunately Jobs".to_string()
}

fn default_interview_label() -> String {
    "Interview Scheduled".to_string()
}

fn default_recurse_nested_parts() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // A missing file means defaults
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LabelerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| LabelerError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LabelerError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LabelerError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| LabelerError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scan.retention_days == 0 {
            return Err(LabelerError::ConfigError(
                "scan.retention_days must be at least 1".to_string(),
            ));
        }
        if self.scan.retention_days > MAX_RETENTION_DAYS {
            return Err(LabelerError::ConfigError(format!(
                "scan.retention_days cannot exceed {}",
                MAX_RETENTION_DAYS
            )));
        }

        // Gmail caps messages.list at 500 per page
        if self.scan.page_size == 0 || self.scan.page_size > 500 {
            return Err(LabelerError::ConfigError(
                "scan.page_size must be between 1 and 500".to_string(),
            ));
        }

        for (key, name) in [
            ("labels.rejection", &self.labels.rejection),
            ("labels.interview", &self.labels.interview),
        ] {
            if name.trim().is_empty() {
                return Err(LabelerError::ConfigError(format!("{} cannot be empty", key)));
            }
        }
        if self
            .labels
            .rejection
            .eq_ignore_ascii_case(&self.labels.interview)
        {
            return Err(LabelerError::ConfigError(
                "labels.rejection and labels.interview must differ".to_string(),
            ));
        }

        for (key, list) in [
            ("phrases.rejection", &self.phrases.rejection),
            ("phrases.interview", &self.phrases.interview),
        ] {
            if let Some(phrases) = list {
                if phrases.is_empty() {
                    return Err(LabelerError::ConfigError(format!(
                        "{} cannot be an empty list (omit it to use the built-in phrases)",
                        key
                    )));
                }
                if phrases.iter().any(|p| p.trim().is_empty()) {
                    return Err(LabelerError::ConfigError(format!(
                        "{} cannot contain blank phrases",
                        key
                    )));
                }
            }
        }

        if self.retry.initial_delay_ms == 0 {
            return Err(LabelerError::ConfigError(
                "retry.initial_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(LabelerError::ConfigError(
                "retry.max_delay_ms cannot be less than retry.initial_delay_ms".to_string(),
            ));
        }
        if self.retry.request_timeout_secs == 0 {
            return Err(LabelerError::ConfigError(
                "retry.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Write the default configuration to `path`; the built-in phrase lists stay implicit
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}

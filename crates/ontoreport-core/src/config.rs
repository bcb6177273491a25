//! Engine configuration
//!
//! One explicit value handed to the engine at construction. Every field has a
//! default so a YAML file only needs the keys it overrides.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Location of the persisted report
    pub report_path: PathBuf,

    /// Root of the submission working directories; log paths are stored relative to it
    pub repository_folder: PathBuf,

    /// Statuses a submission must all carry to count as ready
    pub ready_statuses: Vec<String>,

    /// Pause before the single retry of the administrators lookup
    pub admin_retry_delay_ms: u64,

    pub sampler: SamplerConfig,

    pub lock: LockConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("reports/ontologies_report.json"),
            repository_folder: PathBuf::from("repository"),
            ready_statuses: ["UPLOADED", "RDF", "RDF_LABELS", "OBSOLETE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            admin_retry_delay_ms: 3_000,
            sampler: SamplerConfig::default(),
            lock: LockConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ReportError> {
        serde_yaml::from_str(yaml).map_err(|e| ReportError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn admin_retry_delay(&self) -> Duration {
        Duration::from_millis(self.admin_retry_delay_ms)
    }
}

/// Class sampling bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Labels to collect before stopping
    pub target_size: usize,
    pub page_size: u32,
    /// Labels never used as samples (compared case-insensitively)
    pub stop_words: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_size: 10,
            page_size: 1000,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Lease settings for writers of the report artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub key: String,
    pub ttl_ms: u64,
    /// First pause between polls; doubles up to `max_poll_interval_ms`
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    /// Give up once this much time has been spent waiting
    pub max_wait_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key: "ONTOLOGIES_REPORT_LOCK".to_string(),
            ttl_ms: 10_000,
            poll_interval_ms: 2_000,
            max_poll_interval_ms: 16_000,
            max_wait_ms: 600_000,
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Pause before poll number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(32)).unwrap_or(u64::MAX);
        let ms = self
            .poll_interval_ms
            .saturating_mul(factor)
            .min(self.max_poll_interval_ms.max(self.poll_interval_ms));
        Duration::from_millis(ms)
    }
}

const DEFAULT_STOP_WORDS: &[&str] = &[
    "A", "ABOUT", "ABOVE", "AFTER", "AGAIN", "AGAINST", "ALL", "AM", "AN", "AND", "ANY", "ARE",
    "AS", "AT", "BE", "BECAUSE", "BEEN", "BEFORE", "BEING", "BELOW", "BETWEEN", "BOTH", "BUT",
    "BY", "CAN", "DID", "DO", "DOES", "DOING", "DOWN", "DURING", "EACH", "FEW", "FOR", "FROM",
    "FURTHER", "HAD", "HAS", "HAVE", "HAVING", "HE", "HER", "HERE", "HERS", "HIM", "HIS", "HOW",
    "I", "IF", "IN", "INTO", "IS", "IT", "ITS", "ME", "MORE", "MOST", "MY", "NO", "NOR", "NOT",
    "NOW", "OF", "OFF", "ON", "ONCE", "ONLY", "OR", "OTHER", "OUR", "OURS", "OUT", "OVER", "OWN",
    "SAME", "SHE", "SHOULD", "SO", "SOME", "SUCH", "THAN", "THAT", "THE", "THEIR", "THEM",
    "THEN", "THERE", "THESE", "THEY", "THIS", "THOSE", "THROUGH", "TO", "TOO", "UNDER", "UNTIL",
    "UP", "VERY", "WAS", "WE", "WERE", "WHAT", "WHEN", "WHERE", "WHICH", "WHILE", "WHO", "WHOM",
    "WHY", "WITH", "YOU", "YOUR", "YOURS",
];

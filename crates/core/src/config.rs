//! Attendance policy configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below.
//!
//! ```toml
//! default_grace_minutes = 15
//! max_validity_minutes = 120
//! single_active_token = false
//! after_end_check_in = "late"
//!
//! [retry]
//! max_attempts = 3
//! ```

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How to classify a check-in made at or after the session's end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AfterEndPolicy {
    #[default]
    Late,
    Absent,
}

/// Bounded retry with exponential backoff for store calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 20,
            max_backoff_ms: 500,
        }
    }
}

/// Policy knobs for issuance, validation and classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Grace after session start for sessions without their own value
    pub default_grace_minutes: u32,
    /// Upper bound on requested credential validity
    pub max_validity_minutes: u32,
    /// How long a credential may outlive its session
    pub token_grace_after_end_minutes: u32,
    /// Issuing a credential revokes every other credential of the session
    pub single_active_token: bool,
    pub after_end_check_in: AfterEndPolicy,
    /// Check-ins earlier than `start - early_check_in_minutes` are refused
    pub early_check_in_minutes: u32,
    /// Refuse students missing from the session roster
    pub enforce_enrollment: bool,
    pub retry: RetryConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_grace_minutes: 15,
            max_validity_minutes: 120,
            token_grace_after_end_minutes: 5,
            single_active_token: false,
            after_end_check_in: AfterEndPolicy::Late,
            early_check_in_minutes: 30,
            enforce_enrollment: true,
            retry: RetryConfig::default(),
        }
    }
}

impl PolicyConfig {
    /// Parse and validate policy from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PolicyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load policy from a file, using defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No policy file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_validity_minutes == 0 {
            return Err(Error::Config("max_validity_minutes must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(Error::Config(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn max_validity(&self) -> Duration {
        Duration::minutes(i64::from(self.max_validity_minutes))
    }

    pub fn token_grace_after_end(&self) -> Duration {
        Duration::minutes(i64::from(self.token_grace_after_end_minutes))
    }

    pub fn early_check_in_window(&self) -> Duration {
        Duration::minutes(i64::from(self.early_check_in_minutes))
    }
}

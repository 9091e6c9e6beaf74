//! Runtime configuration for the plasma tooling.
//!
//! Configuration lives in a small JSON document:
//!
//! ```json
//! { "fusion_unit": 100000000, "plasma_per_fusion_unit": 2100, "log_filter": "info" }
//! ```
//!
//! Every field is optional.  A missing file yields the defaults, and the
//! `PLASMA_LOG` / `PLASMA_THREADS` environment variables override the log
//! filter and the batch thread count.

use crate::constants::{FUSION_UNIT, PLASMA_PER_FUSION_UNIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding [`PlasmaConfig::log_filter`].
pub const LOG_ENV: &str = "PLASMA_LOG";
/// Environment variable overriding [`PlasmaConfig::batch_threads`].
pub const THREADS_ENV: &str = "PLASMA_THREADS";

/// Fixed ratio converting fused stake into plasma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionRatio {
    /// Base units making up one fusion unit.
    pub fusion_unit: u64,
    /// Plasma granted per whole fusion unit.
    pub plasma_per_fusion_unit: u64,
}

impl Default for FusionRatio {
    fn default() -> Self {
        Self {
            fusion_unit: FUSION_UNIT,
            plasma_per_fusion_unit: PLASMA_PER_FUSION_UNIT,
        }
    }
}

impl FusionRatio {
    /// Converts `amount` base units to plasma; partial units are dropped.
    ///
    /// ```
    /// use fused_plasma::FusionRatio;
    ///
    /// let ratio = FusionRatio::default();
    /// assert_eq!(ratio.to_plasma(10 * 100_000_000), 21_000);
    /// assert_eq!(ratio.to_plasma(99_999_999), 0);
    /// ```
    pub fn to_plasma(&self, amount: u64) -> u64 {
        if self.fusion_unit == 0 {
            return 0;
        }
        (amount / self.fusion_unit).saturating_mul(self.plasma_per_fusion_unit)
    }

    /// Rejects ratios that would make every account plasma-less.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fusion_unit == 0 {
            return Err(ConfigError::Invalid("fusion_unit must be non-zero".into()));
        }
        if self.plasma_per_fusion_unit == 0 {
            return Err(ConfigError::Invalid(
                "plasma_per_fusion_unit must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Tooling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaConfig {
    /// Base units per fusion unit.
    pub fusion_unit: u64,
    /// Plasma per fusion unit.
    pub plasma_per_fusion_unit: u64,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Worker threads for batch evaluation; `None` uses the rayon default.
    pub batch_threads: Option<usize>,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        let ratio = FusionRatio::default();
        Self {
            fusion_unit: ratio.fusion_unit,
            plasma_per_fusion_unit: ratio.plasma_per_fusion_unit,
            log_filter: "info".to_string(),
            batch_threads: None,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    /// File-system failure.
    Io(String),
    #[error("config parse error: {0}")]
    /// Malformed JSON or environment value.
    Parse(String),
    #[error("invalid config: {0}")]
    /// A value is out of range.
    Invalid(String),
}

impl PlasmaConfig {
    /// Loads from JSON; missing file -> defaults.  Environment overrides are
    /// applied and the result is validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
            serde_json::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
        if let Some(threads) = lookup(THREADS_ENV).filter(|v| !v.trim().is_empty()) {
            let parsed = threads
                .trim()
                .parse::<usize>()
                .map_err(|err| ConfigError::Parse(format!("{THREADS_ENV}: {err}")))?;
            self.batch_threads = Some(parsed);
        }
        Ok(())
    }

    /// Rejects zero ratios and an empty worker pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fusion_ratio().validate()?;
        if self.batch_threads == Some(0) {
            return Err(ConfigError::Invalid("batch_threads must be non-zero".into()));
        }
        Ok(())
    }

    /// Stake to plasma ratio described by this config.
    pub fn fusion_ratio(&self) -> FusionRatio {
        FusionRatio {
            fusion_unit: self.fusion_unit,
            plasma_per_fusion_unit: self.plasma_per_fusion_unit,
        }
    }
}

//! Configuration types for the Agent Memory Layer.
//!
//! `MemoryLayerConfig` represents the `config.toml` in the memory data
//! directory. Its `[pruning]` table drives the config-derived pruning
//! strategy and the optional prune schedule.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ensure_non_negative, ensure_unit_range};
use crate::pruning::{
    PerformanceBasedStrategy, PruneStrategy, SpaceBasedStrategy, TimeBasedStrategy,
};

/// Default flat size assumed for one removed item when estimating freed bytes.
pub const DEFAULT_APPROX_ITEM_BYTES: u64 = 1024;

/// Cadence of scheduled pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruneSchedule {
    Hourly,
    Daily,
    Weekly,
}

impl PruneSchedule {
    /// Interval between two scheduled runs.
    pub fn period(&self) -> Duration {
        match self {
            PruneSchedule::Hourly => Duration::from_secs(60 * 60),
            PruneSchedule::Daily => Duration::from_secs(24 * 60 * 60),
            PruneSchedule::Weekly => Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl Default for PruneSchedule {
    fn default() -> Self {
        PruneSchedule::Daily
    }
}

impl fmt::Display for PruneSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneSchedule::Hourly => write!(f, "hourly"),
            PruneSchedule::Daily => write!(f, "daily"),
            PruneSchedule::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for PruneSchedule {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(PruneSchedule::Hourly),
            "daily" => Ok(PruneSchedule::Daily),
            "weekly" => Ok(PruneSchedule::Weekly),
            _ => Err(ConfigurationError::InvalidSchedule(s.to_string())),
        }
    }
}

/// Pruning configuration.
///
/// All fields have defaults. The framework-level keys (`maxAgeDays`,
/// `minUsageRate`, `minConfidence`) are also accepted in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Gates scheduled pruning. Manual `prune` calls ignore it.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub schedule: PruneSchedule,

    #[serde(default = "default_max_age_days", alias = "maxAgeDays")]
    pub max_age_days: f64,

    #[serde(default = "default_min_usage_rate", alias = "minUsageRate")]
    pub min_usage_rate: f64,

    #[serde(default = "default_min_confidence", alias = "minConfidence")]
    pub min_confidence: f64,

    #[serde(default = "default_min_success_rate", alias = "minSuccessRate")]
    pub min_success_rate: f64,

    #[serde(default = "default_min_execution_count", alias = "minExecutionCount")]
    pub min_execution_count: u64,

    #[serde(default, alias = "maxPatterns")]
    pub max_patterns: Option<usize>,

    #[serde(default, alias = "maxSolutions")]
    pub max_solutions: Option<usize>,

    #[serde(default, alias = "maxDecisions")]
    pub max_decisions: Option<usize>,

    /// Flat per-item size used for the `bytes_freed` approximation.
    #[serde(default = "default_approx_item_bytes", alias = "approxItemBytes")]
    pub approx_item_bytes: u64,
}

fn default_max_age_days() -> f64 {
    90.0
}

fn default_min_usage_rate() -> f64 {
    0.1
}

fn default_min_confidence() -> f64 {
    0.15
}

fn default_min_success_rate() -> f64 {
    0.2
}

fn default_min_execution_count() -> u64 {
    3
}

fn default_approx_item_bytes() -> u64 {
    DEFAULT_APPROX_ITEM_BYTES
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: PruneSchedule::default(),
            max_age_days: default_max_age_days(),
            min_usage_rate: default_min_usage_rate(),
            min_confidence: default_min_confidence(),
            min_success_rate: default_min_success_rate(),
            min_execution_count: default_min_execution_count(),
            max_patterns: None,
            max_solutions: None,
            max_decisions: None,
            approx_item_bytes: default_approx_item_bytes(),
        }
    }
}

impl PruningConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure_non_negative("max_age_days", self.max_age_days)?;
        ensure_non_negative("min_usage_rate", self.min_usage_rate)?;
        ensure_unit_range("min_confidence", self.min_confidence)?;
        ensure_unit_range("min_success_rate", self.min_success_rate)?;
        if self.approx_item_bytes == 0 {
            return Err(ConfigurationError::Zero {
                field: "approx_item_bytes",
            });
        }
        Ok(())
    }

    /// Strategy used when `prune` is called without an explicit one.
    ///
    /// The space axis is only present when at least one cap is set.
    pub fn strategy(&self) -> PruneStrategy {
        let space = SpaceBasedStrategy {
            max_patterns: self.max_patterns,
            max_solutions: self.max_solutions,
            max_decisions: self.max_decisions,
        };

        PruneStrategy {
            time_based: Some(TimeBasedStrategy {
                max_age_days: self.max_age_days,
                min_usage_rate: self.min_usage_rate,
            }),
            performance_based: Some(PerformanceBasedStrategy {
                min_confidence: self.min_confidence,
                min_success_rate: self.min_success_rate,
                min_execution_count: self.min_execution_count,
            }),
            space_based: (!space.is_unbounded()).then_some(space),
        }
    }

    /// Return a copy with every `Some` field of `update` applied.
    pub fn merged(&self, update: &PruningConfigUpdate) -> PruningConfig {
        let mut next = self.clone();
        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(schedule) = update.schedule {
            next.schedule = schedule;
        }
        if let Some(v) = update.max_age_days {
            next.max_age_days = v;
        }
        if let Some(v) = update.min_usage_rate {
            next.min_usage_rate = v;
        }
        if let Some(v) = update.min_confidence {
            next.min_confidence = v;
        }
        if let Some(v) = update.min_success_rate {
            next.min_success_rate = v;
        }
        if let Some(v) = update.min_execution_count {
            next.min_execution_count = v;
        }
        if let Some(v) = update.max_patterns {
            next.max_patterns = v;
        }
        if let Some(v) = update.max_solutions {
            next.max_solutions = v;
        }
        if let Some(v) = update.max_decisions {
            next.max_decisions = v;
        }
        if let Some(v) = update.approx_item_bytes {
            next.approx_item_bytes = v;
        }
        next
    }
}

/// Partial update for [`PruningConfig`]. `None` leaves a field untouched.
///
/// The cap fields are doubly optional: `Some(None)` clears a cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruningConfigUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub schedule: Option<PruneSchedule>,
    #[serde(default)]
    pub max_age_days: Option<f64>,
    #[serde(default)]
    pub min_usage_rate: Option<f64>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub min_success_rate: Option<f64>,
    #[serde(default)]
    pub min_execution_count: Option<u64>,
    #[serde(default)]
    pub max_patterns: Option<Option<usize>>,
    #[serde(default)]
    pub max_solutions: Option<Option<usize>>,
    #[serde(default)]
    pub max_decisions: Option<Option<usize>>,
    #[serde(default)]
    pub approx_item_bytes: Option<u64>,
}

/// Top-level configuration for the memory layer.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLayerConfig {
    #[serde(default)]
    pub pruning: PruningConfig,
}

impl MemoryLayerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.pruning.validate()
    }
}

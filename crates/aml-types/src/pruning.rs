//! Pruning strategy and result types.
//!
//! A `PruneStrategy` has three independently optional axes. The pruning
//! service applies them per collection in a fixed order: time, then
//! performance, then space.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ensure_non_negative, ensure_unit_range};

/// Remove entries older than `max_age_days` unless they are still used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBasedStrategy {
    pub max_age_days: f64,
    /// Uses per day an old entry needs to survive.
    pub min_usage_rate: f64,
}

/// Remove entries whose scores fall below the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBasedStrategy {
    pub min_confidence: f64,
    pub min_success_rate: f64,
    /// Patterns with fewer executions are not judged yet.
    #[serde(default)]
    pub min_execution_count: u64,
}

/// Per-collection caps. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceBasedStrategy {
    #[serde(default)]
    pub max_patterns: Option<usize>,
    #[serde(default)]
    pub max_solutions: Option<usize>,
    #[serde(default)]
    pub max_decisions: Option<usize>,
}

impl SpaceBasedStrategy {
    pub fn is_unbounded(&self) -> bool {
        self.max_patterns.is_none() && self.max_solutions.is_none() && self.max_decisions.is_none()
    }
}

/// Full pruning strategy. Omitted axes pass collections through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneStrategy {
    #[serde(default)]
    pub time_based: Option<TimeBasedStrategy>,
    #[serde(default)]
    pub performance_based: Option<PerformanceBasedStrategy>,
    #[serde(default)]
    pub space_based: Option<SpaceBasedStrategy>,
}

impl PruneStrategy {
    /// A strategy with no axes; pruning with it is the identity.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.time_based.is_none() && self.performance_based.is_none() && self.space_based.is_none()
    }

    /// Check every configured threshold.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(time) = &self.time_based {
            ensure_non_negative("max_age_days", time.max_age_days)?;
            ensure_non_negative("min_usage_rate", time.min_usage_rate)?;
        }
        if let Some(perf) = &self.performance_based {
            ensure_unit_range("min_confidence", perf.min_confidence)?;
            ensure_unit_range("min_success_rate", perf.min_success_rate)?;
        }
        Ok(())
    }
}

/// Why an entry was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    UnusedTooLong,
    LowSuccessRate,
    LowConfidence,
    IneffectiveSolution,
    NegativeOutcome,
    MemoryLimitExceeded,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::UnusedTooLong => write!(f, "unused_too_long"),
            PruneReason::LowSuccessRate => write!(f, "low_success_rate"),
            PruneReason::LowConfidence => write!(f, "low_confidence"),
            PruneReason::IneffectiveSolution => write!(f, "ineffective_solution"),
            PruneReason::NegativeOutcome => write!(f, "negative_outcome"),
            PruneReason::MemoryLimitExceeded => write!(f, "memory_limit_exceeded"),
        }
    }
}

/// Summary of one prune run for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneResult {
    pub agent: String,
    pub patterns_removed: usize,
    pub solutions_removed: usize,
    pub decisions_removed: usize,
    /// Approximation: removed items times a flat per-item size. Not a
    /// measured byte count.
    pub bytes_freed: u64,
    pub duration: Duration,
    /// Removal count per reason; sums to `total_removed()`.
    #[serde(default)]
    pub reasons: BTreeMap<PruneReason, usize>,
}

impl PruneResult {
    pub fn total_removed(&self) -> usize {
        self.patterns_removed + self.solutions_removed + self.decisions_removed
    }
}

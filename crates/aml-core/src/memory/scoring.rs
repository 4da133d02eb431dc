//! Derived scores for memory entities.
//!
//! Every score is a pure function of an entity snapshot plus an explicit
//! `now`. Confidence and success values are bounded to [0, 1] and are 0
//! when their denominator is 0.
//!
//! Weight blends three terms:
//!
//! ```text
//! weight = confidence_weight * confidence
//!        + recency_weight    * 0.5 ^ (elapsed_days / half_life_days)
//!        + usage_weight      * min(uses_per_day / usage_saturation_per_day, 1)
//! ```
//!
//! Weights are only comparable between entities of the same kind.

use aml_types::error::{ConfigurationError, ensure_non_negative};
use aml_types::memory::{Decision, EntityKind, Pattern, Solution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Confidence assigned to a decision whose outcome is still open.
pub const OPEN_DECISION_CONFIDENCE: f64 = 0.5;

/// Tunable constants of the scoring formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Days after which the recency term halves.
    pub half_life_days: f64,
    /// Executions needed before pattern confidence reaches half its success rate.
    pub evidence_scale: f64,
    /// Uses per day at which the usage term saturates at 1.
    pub usage_saturation_per_day: f64,
    pub confidence_weight: f64,
    pub recency_weight: f64,
    pub usage_weight: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            half_life_days: 30.0,
            evidence_scale: 5.0,
            usage_saturation_per_day: 1.0,
            confidence_weight: 0.5,
            recency_weight: 0.3,
            usage_weight: 0.2,
        }
    }
}

impl ScoringParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure_non_negative("half_life_days", self.half_life_days)?;
        if self.half_life_days == 0.0 {
            return Err(ConfigurationError::Zero {
                field: "half_life_days",
            });
        }
        ensure_non_negative("usage_saturation_per_day", self.usage_saturation_per_day)?;
        if self.usage_saturation_per_day == 0.0 {
            return Err(ConfigurationError::Zero {
                field: "usage_saturation_per_day",
            });
        }
        ensure_non_negative("evidence_scale", self.evidence_scale)?;
        ensure_non_negative("confidence_weight", self.confidence_weight)?;
        ensure_non_negative("recency_weight", self.recency_weight)?;
        ensure_non_negative("usage_weight", self.usage_weight)?;
        Ok(())
    }

    /// `0.5 ^ (elapsed_days / half_life_days)`; 0 for an unknown (infinite) age.
    pub fn recency(&self, elapsed_days: f64) -> f64 {
        if !elapsed_days.is_finite() {
            return 0.0;
        }
        0.5_f64.powf(elapsed_days.max(0.0) / self.half_life_days)
    }

    /// Usage frequency normalized to [0, 1].
    pub fn usage(&self, uses_per_day: f64) -> f64 {
        (uses_per_day / self.usage_saturation_per_day).clamp(0.0, 1.0)
    }

    fn blend(&self, confidence: f64, elapsed_days: f64, uses_per_day: f64) -> f64 {
        self.confidence_weight * confidence
            + self.recency_weight * self.recency(elapsed_days)
            + self.usage_weight * self.usage(uses_per_day)
    }
}

/// Days from `since` to `now`, clamped at 0. `None` is treated as infinitely old.
pub fn elapsed_days(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match since {
        Some(ts) => {
            let seconds = (now - ts).num_milliseconds() as f64 / 1000.0;
            (seconds / SECONDS_PER_DAY).max(0.0)
        }
        None => f64::INFINITY,
    }
}

fn per_day(count: u64, age_days: f64) -> f64 {
    count as f64 / age_days.max(1.0)
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

pub fn pattern_success_rate(pattern: &Pattern) -> f64 {
    ratio(pattern.metrics.success_count, pattern.metrics.execution_count)
}

/// Success rate shrunk toward 0 while there is little evidence.
pub fn pattern_confidence(pattern: &Pattern, params: &ScoringParams) -> f64 {
    let n = pattern.metrics.execution_count as f64;
    if n == 0.0 {
        return 0.0;
    }
    pattern_success_rate(pattern) * n / (n + params.evidence_scale)
}

/// Executions per day since the pattern first appeared (age floored at one day).
pub fn pattern_usage_rate(pattern: &Pattern, now: DateTime<Utc>) -> f64 {
    per_day(
        pattern.metrics.execution_count,
        elapsed_days(pattern.first_seen(), now),
    )
}

pub fn pattern_weight(pattern: &Pattern, params: &ScoringParams, now: DateTime<Utc>) -> f64 {
    params.blend(
        pattern_confidence(pattern, params),
        elapsed_days(pattern.last_activity(), now),
        pattern_usage_rate(pattern, now),
    )
}

// ---------------------------------------------------------------------------
// Solution
// ---------------------------------------------------------------------------

pub fn solution_confidence(solution: &Solution) -> f64 {
    if solution.effectiveness.worked { 1.0 } else { 0.0 }
}

/// Reuses per day since the solution was recorded.
pub fn solution_reuse_rate(solution: &Solution, now: DateTime<Utc>) -> f64 {
    per_day(
        solution.effectiveness.reuse_count,
        elapsed_days(Some(solution.timestamp), now),
    )
}

pub fn solution_weight(solution: &Solution, params: &ScoringParams, now: DateTime<Utc>) -> f64 {
    params.blend(
        solution_confidence(solution),
        elapsed_days(Some(solution.timestamp), now),
        solution_reuse_rate(solution, now),
    )
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Score of a resolved outcome; `None` while the decision is open.
///
/// A decision that would not be repeated scores 0. Otherwise the mean of
/// its success metrics (1 when none were recorded).
pub fn decision_outcome_score(decision: &Decision) -> Option<f64> {
    let outcome = decision.outcome.as_ref()?;
    if !outcome.would_repeat {
        return Some(0.0);
    }
    let metrics: Vec<f64> = outcome
        .success_metrics
        .values()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if metrics.is_empty() {
        return Some(1.0);
    }
    let mean = metrics.iter().sum::<f64>() / metrics.len() as f64;
    Some(mean.clamp(0.0, 1.0))
}

pub fn decision_weight(decision: &Decision, params: &ScoringParams, now: DateTime<Utc>) -> f64 {
    let confidence = decision_outcome_score(decision).unwrap_or(OPEN_DECISION_CONFIDENCE);
    params.blend(confidence, elapsed_days(Some(decision.timestamp), now), 0.0)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Borrowed view over one entity of any kind.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Pattern(&'a Pattern),
    Solution(&'a Solution),
    Decision(&'a Decision),
}

impl EntityRef<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Pattern(_) => EntityKind::Pattern,
            EntityRef::Solution(_) => EntityKind::Solution,
            EntityRef::Decision(_) => EntityKind::Decision,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityRef::Pattern(p) => &p.id,
            EntityRef::Solution(s) => &s.id,
            EntityRef::Decision(d) => &d.id,
        }
    }

    /// Days since the entity was last active.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        match self {
            EntityRef::Pattern(p) => elapsed_days(p.last_activity(), now),
            EntityRef::Solution(s) => elapsed_days(Some(s.timestamp), now),
            EntityRef::Decision(d) => elapsed_days(Some(d.timestamp), now),
        }
    }

    /// Usage rate compared against `min_usage_rate` by time-based pruning.
    ///
    /// Patterns report executions per day. Solutions and decisions report
    /// 1 when they worked / would be repeated, else 0 (open decisions: 0).
    pub fn usage_rate(&self, now: DateTime<Utc>) -> f64 {
        match self {
            EntityRef::Pattern(p) => pattern_usage_rate(p, now),
            EntityRef::Solution(s) => solution_confidence(s),
            EntityRef::Decision(d) => match d.would_repeat() {
                Some(true) => 1.0,
                _ => 0.0,
            },
        }
    }

    pub fn weight(&self, params: &ScoringParams, now: DateTime<Utc>) -> f64 {
        match self {
            EntityRef::Pattern(p) => pattern_weight(p, params, now),
            EntityRef::Solution(s) => solution_weight(s, params, now),
            EntityRef::Decision(d) => decision_weight(d, params, now),
        }
    }
}

/// Types that can be viewed as an [`EntityRef`].
pub trait AsEntity {
    fn as_entity(&self) -> EntityRef<'_>;
}

impl AsEntity for Pattern {
    fn as_entity(&self) -> EntityRef<'_> {
        EntityRef::Pattern(self)
    }
}

impl AsEntity for Solution {
    fn as_entity(&self) -> EntityRef<'_> {
        EntityRef::Solution(self)
    }
}

impl AsEntity for Decision {
    fn as_entity(&self) -> EntityRef<'_> {
        EntityRef::Decision(self)
    }
}

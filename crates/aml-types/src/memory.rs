//! Memory entity types for the Agent Memory Layer.
//!
//! These types model the three collections kept per agent: reusable
//! patterns, recorded solutions, and consequential decisions. They carry
//! only stored data; derived scores live in `aml-core::memory::scoring`.
//!
//! JSON field names are camelCase to match the collections persisted by
//! the rest of the framework.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a memory entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Pattern,
    Solution,
    Decision,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Pattern => write!(f, "pattern"),
            EntityKind::Solution => write!(f, "solution"),
            EntityKind::Decision => write!(f, "decision"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pattern" => Ok(EntityKind::Pattern),
            "solution" => Ok(EntityKind::Solution),
            "decision" => Ok(EntityKind::Decision),
            other => Err(format!("invalid entity kind: '{other}'")),
        }
    }
}

/// Execution counters for a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMetrics {
    /// How many times the pattern has been applied.
    #[serde(default)]
    pub execution_count: u64,
    /// How many of those applications succeeded.
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub avg_time_saved_ms: f64,
}

/// Lifecycle information for a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEvolution {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last time the pattern was reused. Drives recency and time-based pruning.
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u32,
}

/// A recorded reusable problem/approach pairing.
///
/// Created when reasoning is judged reusable; `metrics` and `evolution`
/// are updated on every reuse. Only pruning removes a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    /// Free-form key-value bag describing where the pattern applies.
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub metrics: PatternMetrics,
    #[serde(default)]
    pub evolution: PatternEvolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Pattern {
    /// Most recent known activity: last use, else creation, else record time.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.evolution
            .last_used
            .or(self.evolution.created_at)
            .or(self.timestamp)
    }

    /// When the pattern first appeared: creation, else record time, else last use.
    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.evolution
            .created_at
            .or(self.timestamp)
            .or(self.evolution.last_used)
    }
}

/// Effectiveness record of a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effectiveness {
    pub worked: bool,
    /// Times the solution was reused after being recorded.
    #[serde(default)]
    pub reuse_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_solve_ms: Option<u64>,
}

/// A recorded concrete fix. The payload is immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub effectiveness: Effectiveness,
    /// Problem/fix description and any other fields, kept verbatim.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Resolved outcome of a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub would_repeat: bool,
    /// Named success scores, each expected in [0, 1].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub success_metrics: BTreeMap<String, f64>,
}

/// A recorded consequential choice.
///
/// Open until `outcome` is resolved; the outcome is set at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DecisionOutcome>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Decision {
    pub fn has_outcome(&self) -> bool {
        self.outcome.is_some()
    }

    /// `Some(would_repeat)` for closed decisions, `None` while open.
    pub fn would_repeat(&self) -> Option<bool> {
        self.outcome.as_ref().map(|o| o.would_repeat)
    }
}

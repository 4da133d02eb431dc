//! The three pruning axes, applied to one collection at a time.
//!
//! Order is fixed: time, then performance, then space. Each stage only sees
//! what the previous stage kept. Survivors keep their input order.

use std::collections::BTreeMap;

use aml_types::memory::EntityKind;
use aml_types::pruning::{
    PerformanceBasedStrategy, PruneReason, PruneStrategy, SpaceBasedStrategy, TimeBasedStrategy,
};
use chrono::{DateTime, Utc};

use crate::memory::scoring::{
    AsEntity, EntityRef, ScoringParams, decision_outcome_score, pattern_confidence,
    pattern_success_rate, solution_confidence,
};

/// Time axis: old entries must still be used to survive.
pub fn time_verdict(
    entity: EntityRef<'_>,
    strategy: &TimeBasedStrategy,
    now: DateTime<Utc>,
) -> Option<PruneReason> {
    if entity.age_days(now) <= strategy.max_age_days {
        return None;
    }
    if entity.usage_rate(now) >= strategy.min_usage_rate {
        return None;
    }
    Some(PruneReason::UnusedTooLong)
}

/// Performance axis. Open decisions are never judged here.
pub fn performance_verdict(
    entity: EntityRef<'_>,
    strategy: &PerformanceBasedStrategy,
    params: &ScoringParams,
) -> Option<PruneReason> {
    match entity {
        EntityRef::Pattern(p) => {
            if p.metrics.execution_count < strategy.min_execution_count {
                return None;
            }
            if pattern_success_rate(p) < strategy.min_success_rate {
                return Some(PruneReason::LowSuccessRate);
            }
            if pattern_confidence(p, params) < strategy.min_confidence {
                return Some(PruneReason::LowConfidence);
            }
            None
        }
        EntityRef::Solution(s) => {
            let confidence = solution_confidence(s);
            (confidence < strategy.min_confidence || confidence < strategy.min_success_rate)
                .then_some(PruneReason::IneffectiveSolution)
        }
        EntityRef::Decision(d) => {
            let score = decision_outcome_score(d)?;
            let negative = d.would_repeat() == Some(false)
                || score < strategy.min_success_rate
                || score < strategy.min_confidence;
            negative.then_some(PruneReason::NegativeOutcome)
        }
    }
}

fn cap_for(space: &SpaceBasedStrategy, kind: EntityKind) -> Option<usize> {
    match kind {
        EntityKind::Pattern => space.max_patterns,
        EntityKind::Solution => space.max_solutions,
        EntityKind::Decision => space.max_decisions,
    }
}

/// Keep the `cap` highest-weight items of `items`.
///
/// Ties go to the earlier item. Returns the kept items in input order.
pub fn keep_top_by_weight<'a, T: AsEntity>(
    items: Vec<&'a T>,
    cap: usize,
    params: &ScoringParams,
    now: DateTime<Utc>,
) -> Vec<&'a T> {
    if items.len() <= cap {
        return items;
    }

    let mut ranked: Vec<(usize, f64)> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (idx, item.as_entity().weight(params, now)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut keep = vec![false; items.len()];
    for (idx, _) in ranked.into_iter().take(cap) {
        keep[idx] = true;
    }

    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, kept)| kept.then_some(item))
        .collect()
}

/// Run every configured axis over one collection.
///
/// Never mutates `items`; survivors are cloned into the returned vector.
/// Removal reasons are added to `reasons`.
pub fn prune_collection<T: AsEntity + Clone>(
    items: &[T],
    kind: EntityKind,
    strategy: &PruneStrategy,
    params: &ScoringParams,
    now: DateTime<Utc>,
    reasons: &mut BTreeMap<PruneReason, usize>,
) -> Vec<T> {
    let mut survivors: Vec<&T> = items.iter().collect();

    if let Some(time) = &strategy.time_based {
        survivors.retain(|item| match time_verdict(item.as_entity(), time, now) {
            Some(reason) => {
                tracing::debug!(%kind, id = item.as_entity().id(), ?reason, "entry pruned");
                *reasons.entry(reason).or_default() += 1;
                false
            }
            None => true,
        });
        tracing::debug!(%kind, kept = survivors.len(), "time-based filter applied");
    }

    if let Some(perf) = &strategy.performance_based {
        survivors.retain(
            |item| match performance_verdict(item.as_entity(), perf, params) {
                Some(reason) => {
                    tracing::debug!(%kind, id = item.as_entity().id(), ?reason, "entry pruned");
                    *reasons.entry(reason).or_default() += 1;
                    false
                }
                None => true,
            },
        );
        tracing::debug!(%kind, kept = survivors.len(), "performance-based filter applied");
    }

    if let Some(cap) = strategy.space_based.as_ref().and_then(|s| cap_for(s, kind)) {
        let before = survivors.len();
        survivors = keep_top_by_weight(survivors, cap, params, now);
        let evicted = before - survivors.len();
        if evicted > 0 {
            *reasons.entry(PruneReason::MemoryLimitExceeded).or_default() += evicted;
            tracing::debug!(%kind, cap, evicted, "space-based filter evicted lowest weights");
        }
    }

    survivors.into_iter().cloned().collect()
}

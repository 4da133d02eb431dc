//! The pruning service: strategy application, live config and scheduling.
//!
//! `prune` is synchronous and pure over the borrowed collections. It
//! validates the strategy first and otherwise cannot fail; "nothing
//! removed" is a successful run.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use aml_types::config::{PruningConfig, PruningConfigUpdate};
use aml_types::error::ConfigurationError;
use aml_types::memory::{Decision, EntityKind, Pattern, Solution};
use aml_types::pruning::{PruneResult, PruneStrategy};
use chrono::{DateTime, Utc};

use super::filter::prune_collection;
use super::locks::AgentLocks;
use super::schedule::{ScheduleStart, ScheduledTask};
use crate::memory::scoring::ScoringParams;

/// Collections that survived a prune run, plus its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    pub patterns: Vec<Pattern>,
    pub solutions: Vec<Solution>,
    pub decisions: Vec<Decision>,
    pub result: PruneResult,
}

/// Applies pruning strategies to one agent's memory at a time.
///
/// Holds the live [`PruningConfig`] (source of the default strategy and of
/// the schedule), the scoring constants, the per-agent lock registry, and
/// at most one scheduled timer task.
#[derive(Debug)]
pub struct PruningService {
    config: PruningConfig,
    scoring: ScoringParams,
    locks: AgentLocks,
    scheduled: Option<ScheduledTask>,
}

impl PruningService {
    /// Create a service with default scoring constants.
    pub fn new(config: PruningConfig) -> Result<Self, ConfigurationError> {
        Self::with_scoring(config, ScoringParams::default())
    }

    pub fn with_scoring(
        config: PruningConfig,
        scoring: ScoringParams,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        scoring.validate()?;
        Ok(Self {
            config,
            scoring,
            locks: AgentLocks::new(),
            scheduled: None,
        })
    }

    pub fn config(&self) -> &PruningConfig {
        &self.config
    }

    pub fn scoring(&self) -> &ScoringParams {
        &self.scoring
    }

    /// Lock registry callers use to serialize load-prune-persist per agent.
    pub fn agent_locks(&self) -> AgentLocks {
        self.locks.clone()
    }

    /// Prune one agent's collections as of now.
    ///
    /// Without an explicit `strategy` the one derived from the live config
    /// is used.
    pub fn prune(
        &self,
        agent: &str,
        patterns: &[Pattern],
        solutions: &[Solution],
        decisions: &[Decision],
        strategy: Option<&PruneStrategy>,
    ) -> Result<PruneOutcome, ConfigurationError> {
        self.prune_at(Utc::now(), agent, patterns, solutions, decisions, strategy)
    }

    /// Same as [`prune`](Self::prune) with an explicit clock.
    pub fn prune_at(
        &self,
        now: DateTime<Utc>,
        agent: &str,
        patterns: &[Pattern],
        solutions: &[Solution],
        decisions: &[Decision],
        strategy: Option<&PruneStrategy>,
    ) -> Result<PruneOutcome, ConfigurationError> {
        let strategy = match strategy {
            Some(s) => *s,
            None => self.config.strategy(),
        };
        strategy.validate()?;

        let started = Instant::now();
        let mut reasons = BTreeMap::new();

        let kept_patterns = prune_collection(
            patterns,
            EntityKind::Pattern,
            &strategy,
            &self.scoring,
            now,
            &mut reasons,
        );
        let kept_solutions = prune_collection(
            solutions,
            EntityKind::Solution,
            &strategy,
            &self.scoring,
            now,
            &mut reasons,
        );
        let kept_decisions = prune_collection(
            decisions,
            EntityKind::Decision,
            &strategy,
            &self.scoring,
            now,
            &mut reasons,
        );

        let mut result = PruneResult {
            agent: agent.to_string(),
            patterns_removed: patterns.len() - kept_patterns.len(),
            solutions_removed: solutions.len() - kept_solutions.len(),
            decisions_removed: decisions.len() - kept_decisions.len(),
            bytes_freed: 0,
            duration: Duration::ZERO,
            reasons,
        };
        result.bytes_freed =
            (result.total_removed() as u64).saturating_mul(self.config.approx_item_bytes);
        result.duration = started.elapsed();

        tracing::info!(
            agent,
            patterns_removed = result.patterns_removed,
            solutions_removed = result.solutions_removed,
            decisions_removed = result.decisions_removed,
            approx_bytes_freed = result.bytes_freed,
            duration_us = result.duration.as_micros() as u64,
            "memory pruned"
        );

        Ok(PruneOutcome {
            patterns: kept_patterns,
            solutions: kept_solutions,
            decisions: kept_decisions,
            result,
        })
    }

    /// Merge `update` into the live config.
    ///
    /// The merged config is validated before anything is replaced.
    /// Disabling stops a running schedule; a new cadence applies from the
    /// next start.
    pub fn update_config(&mut self, update: &PruningConfigUpdate) -> Result<(), ConfigurationError> {
        let next = self.config.merged(update);
        next.validate()?;

        let cadence_changed = next.schedule != self.config.schedule;
        self.config = next;

        if !self.config.enabled && self.stop_scheduled_pruning() {
            tracing::info!("scheduled pruning stopped: disabled by config update");
        } else if cadence_changed && self.is_scheduled() {
            tracing::info!(
                schedule = %self.config.schedule,
                "prune schedule changed; restart scheduled pruning to apply it"
            );
        }
        Ok(())
    }

    /// Start invoking `callback` on the configured cadence.
    ///
    /// No-op when already running or when the config is disabled. Must be
    /// called from within a Tokio runtime.
    pub fn start_scheduled_pruning<F, Fut, E>(&mut self, callback: F) -> ScheduleStart
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if !self.config.enabled {
            tracing::debug!("scheduled pruning not started: disabled");
            return ScheduleStart::Disabled;
        }
        self.start_with_period(self.config.schedule.period(), callback)
    }

    pub(crate) fn start_with_period<F, Fut, E>(
        &mut self,
        period: Duration,
        callback: F,
    ) -> ScheduleStart
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.is_scheduled() {
            return ScheduleStart::AlreadyRunning;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("scheduled pruning not started: no Tokio runtime");
                return ScheduleStart::NoRuntime;
            }
        };

        self.scheduled = Some(ScheduledTask::spawn(&runtime, period, callback));
        tracing::info!(
            schedule = %self.config.schedule,
            period_secs = period.as_secs(),
            "scheduled pruning started"
        );
        ScheduleStart::Started
    }

    /// Stop the timer. Returns whether one was running; safe when idle.
    pub fn stop_scheduled_pruning(&mut self) -> bool {
        match self.scheduled.take() {
            Some(task) => {
                let was_running = task.is_running();
                task.cancel();
                tracing::info!(period_secs = task.period().as_secs(), "scheduled pruning stopped");
                was_running
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.as_ref().is_some_and(ScheduledTask::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aml_types::memory::{DecisionOutcome, Effectiveness, PatternEvolution, PatternMetrics};
    use aml_types::pruning::{
        PerformanceBasedStrategy, PruneReason, SpaceBasedStrategy, TimeBasedStrategy,
    };
    use chrono::TimeZone;
    use serde_json::Map;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - chrono::Duration::days(days)
    }

    fn pattern(id: &str, executions: u64, successes: u64, idle_days: i64, age_days: i64) -> Pattern {
        Pattern {
            id: id.to_string(),
            context: Map::new(),
            metrics: PatternMetrics {
                execution_count: executions,
                success_count: successes,
                avg_time_saved_ms: 0.0,
            },
            evolution: PatternEvolution {
                created_at: Some(days_ago(age_days)),
                last_used: Some(days_ago(idle_days)),
                version: 1,
            },
            timestamp: None,
        }
    }

    fn solution(id: &str, worked: bool, age_days: i64) -> Solution {
        Solution {
            id: id.to_string(),
            timestamp: days_ago(age_days),
            effectiveness: Effectiveness {
                worked,
                reuse_count: 1,
                time_to_solve_ms: None,
            },
            payload: Map::new(),
        }
    }

    fn decision(id: &str, outcome: Option<bool>, age_days: i64) -> Decision {
        Decision {
            id: id.to_string(),
            timestamp: days_ago(age_days),
            outcome: outcome.map(|would_repeat| DecisionOutcome {
                would_repeat,
                success_metrics: BTreeMap::new(),
            }),
            payload: Map::new(),
        }
    }

    fn fixture() -> (Vec<Pattern>, Vec<Solution>, Vec<Decision>) {
        (
            vec![
                pattern("p-fresh", 30, 27, 1, 20),
                pattern("p-stale", 3, 1, 200, 400),
                pattern("p-failing", 12, 1, 2, 30),
                pattern("p-busy-old", 900, 800, 100, 300),
            ],
            vec![
                solution("s-worked", true, 10),
                solution("s-failed", false, 10),
                solution("s-old-failed", false, 400),
            ],
            vec![
                decision("d-open-old", None, 20),
                decision("d-good", Some(true), 5),
                decision("d-regret", Some(false), 5),
            ],
        )
    }

    fn service() -> PruningService {
        PruningService::new(PruningConfig::default()).unwrap()
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|i| id(i).to_string()).collect()
    }

    #[test]
    fn test_empty_strategy_is_identity() {
        let (patterns, solutions, decisions) = fixture();
        let outcome = service()
            .prune_at(
                now(),
                "backend",
                &patterns,
                &solutions,
                &decisions,
                Some(&PruneStrategy::none()),
            )
            .unwrap();

        assert_eq!(outcome.patterns, patterns);
        assert_eq!(outcome.solutions, solutions);
        assert_eq!(outcome.decisions, decisions);
        assert_eq!(outcome.result.total_removed(), 0);
        assert_eq!(outcome.result.bytes_freed, 0);
        assert!(outcome.result.reasons.is_empty());
    }

    #[test]
    fn test_config_derived_strategy() {
        let (patterns, solutions, decisions) = fixture();
        let outcome = service()
            .prune_at(now(), "backend", &patterns, &solutions, &decisions, None)
            .unwrap();

        assert_eq!(
            ids(&outcome.patterns, |p| &p.id),
            vec!["p-fresh", "p-busy-old"]
        );
        assert_eq!(ids(&outcome.solutions, |s| &s.id), vec!["s-worked"]);
        assert_eq!(
            ids(&outcome.decisions, |d| &d.id),
            vec!["d-open-old", "d-good"]
        );

        let result = &outcome.result;
        assert_eq!(result.agent, "backend");
        assert_eq!(result.patterns_removed, 2);
        assert_eq!(result.solutions_removed, 2);
        assert_eq!(result.decisions_removed, 1);
        assert_eq!(result.bytes_freed, 5 * 1024);
        assert_eq!(result.reasons[&PruneReason::UnusedTooLong], 2);
        assert_eq!(result.reasons[&PruneReason::LowSuccessRate], 1);
        assert_eq!(result.reasons[&PruneReason::IneffectiveSolution], 1);
        assert_eq!(result.reasons[&PruneReason::NegativeOutcome], 1);
        assert_eq!(result.reasons.values().sum::<usize>(), result.total_removed());
    }

    #[test]
    fn test_prune_never_grows_or_mutates_input() {
        let (patterns, solutions, decisions) = fixture();
        let before = fixture();
        let strategies = [
            PruneStrategy::none(),
            PruningConfig::default().strategy(),
            PruneStrategy {
                space_based: Some(SpaceBasedStrategy {
                    max_patterns: Some(1),
                    max_solutions: Some(0),
                    max_decisions: Some(10),
                }),
                ..PruneStrategy::none()
            },
        ];

        for strategy in &strategies {
            let outcome = service()
                .prune_at(now(), "a", &patterns, &solutions, &decisions, Some(strategy))
                .unwrap();
            assert!(outcome.patterns.len() <= patterns.len());
            assert!(outcome.solutions.len() <= solutions.len());
            assert!(outcome.decisions.len() <= decisions.len());
            for survivor in &outcome.patterns {
                assert!(patterns.contains(survivor));
            }
        }
        assert_eq!((patterns, solutions, decisions), before);
    }

    #[test]
    fn test_space_cap_keeps_highest_weights() {
        // Same age and usage; weight is ordered by success rate.
        let patterns: Vec<Pattern> = [("w2", 6), ("w5", 10), ("w1", 4), ("w4", 9), ("w3", 8)]
            .iter()
            .map(|(id, successes)| pattern(id, 10, *successes, 3, 30))
            .collect();
        let strategy = PruneStrategy {
            space_based: Some(SpaceBasedStrategy {
                max_patterns: Some(3),
                ..SpaceBasedStrategy::default()
            }),
            ..PruneStrategy::none()
        };

        let svc = service();
        let outcome = svc
            .prune_at(now(), "a", &patterns, &[], &[], Some(&strategy))
            .unwrap();

        assert_eq!(outcome.patterns.len(), 3);
        assert_eq!(ids(&outcome.patterns, |p| &p.id), vec!["w5", "w4", "w3"]);
        assert_eq!(outcome.result.patterns_removed, 2);
        assert_eq!(outcome.result.reasons[&PruneReason::MemoryLimitExceeded], 2);
    }

    #[test]
    fn test_time_based_usage_threshold() {
        let strategy = PruneStrategy {
            time_based: Some(TimeBasedStrategy {
                max_age_days: 60.0,
                min_usage_rate: 0.5,
            }),
            ..PruneStrategy::none()
        };
        // Idle for 90 days, created 100 days ago.
        let below = pattern("below", 40, 40, 90, 100);
        let at = pattern("at", 50, 50, 90, 100);
        let young_unused = pattern("young", 0, 0, 10, 10);

        let outcome = service()
            .prune_at(
                now(),
                "a",
                &[below, at, young_unused],
                &[],
                &[],
                Some(&strategy),
            )
            .unwrap();
        assert_eq!(ids(&outcome.patterns, |p| &p.id), vec!["at", "young"]);
    }

    #[test]
    fn test_open_decisions_survive_performance_pruning() {
        let strategy = PruneStrategy {
            performance_based: Some(PerformanceBasedStrategy {
                min_confidence: 1.0,
                min_success_rate: 1.0,
                min_execution_count: 0,
            }),
            ..PruneStrategy::none()
        };
        let decisions = vec![
            decision("open-1", None, 1),
            decision("open-2", None, 900),
            decision("closed", Some(false), 1),
        ];
        let outcome = service()
            .prune_at(now(), "a", &[], &[], &decisions, Some(&strategy))
            .unwrap();
        assert_eq!(ids(&outcome.decisions, |d| &d.id), vec!["open-1", "open-2"]);
    }

    #[test]
    fn test_invalid_strategy_is_rejected_before_work() {
        let (patterns, solutions, decisions) = fixture();
        let strategy = PruneStrategy {
            time_based: Some(TimeBasedStrategy {
                max_age_days: -1.0,
                min_usage_rate: 0.0,
            }),
            ..PruneStrategy::none()
        };
        let err = service()
            .prune_at(now(), "a", &patterns, &solutions, &decisions, Some(&strategy))
            .unwrap_err();
        assert_eq!(err.field(), Some("max_age_days"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PruningConfig {
            min_confidence: 2.0,
            ..PruningConfig::default()
        };
        assert!(PruningService::new(config).is_err());
    }

    #[test]
    fn test_update_config_merges_and_validates() {
        let mut svc = service();
        svc.update_config(&PruningConfigUpdate {
            max_age_days: Some(30.0),
            max_patterns: Some(Some(100)),
            ..PruningConfigUpdate::default()
        })
        .unwrap();
        assert!((svc.config().max_age_days - 30.0).abs() < f64::EPSILON);
        assert_eq!(svc.config().max_patterns, Some(100));
        assert!(svc.config().strategy().space_based.is_some());

        let err = svc
            .update_config(&PruningConfigUpdate {
                min_confidence: Some(0.9),
                max_age_days: Some(-2.0),
                ..PruningConfigUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Negative { .. }));
        // Nothing from the rejected update was applied.
        assert!((svc.config().max_age_days - 30.0).abs() < f64::EPSILON);
        assert!((svc.config().min_confidence - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bytes_freed_uses_configured_item_size() {
        let config = PruningConfig {
            approx_item_bytes: 4096,
            ..PruningConfig::default()
        };
        let svc = PruningService::new(config).unwrap();
        let (patterns, solutions, decisions) = fixture();
        let outcome = svc
            .prune_at(now(), "a", &patterns, &solutions, &decisions, None)
            .unwrap();
        assert_eq!(
            outcome.result.bytes_freed,
            outcome.result.total_removed() as u64 * 4096
        );
    }

    #[test]
    fn test_bytes_freed_saturates_for_huge_item_size() {
        let config = PruningConfig {
            approx_item_bytes: u64::MAX,
            ..PruningConfig::default()
        };
        let svc = PruningService::new(config).unwrap();
        let decisions = vec![
            decision("d-regret-1", Some(false), 5),
            decision("d-regret-2", Some(false), 5),
        ];
        let strategy = PruneStrategy {
            performance_based: Some(PerformanceBasedStrategy {
                min_confidence: 0.1,
                min_success_rate: 0.1,
                min_execution_count: 0,
            }),
            ..PruneStrategy::none()
        };

        let outcome = svc
            .prune_at(now(), "backend", &[], &[], &decisions, Some(&strategy))
            .unwrap();
        assert_eq!(outcome.result.decisions_removed, 2);
        assert_eq!(outcome.result.bytes_freed, u64::MAX);
    }

    #[test]
    fn test_repeatable_decisions_are_judged_by_success_metrics() {
        let scored = |id: &str, quality: f64| Decision {
            outcome: Some(DecisionOutcome {
                would_repeat: true,
                success_metrics: BTreeMap::from([("quality".to_string(), quality)]),
            }),
            ..decision(id, None, 5)
        };
        let decisions = vec![scored("d-weak", 0.1), scored("d-strong", 0.9)];

        let outcome = service()
            .prune_at(now(), "backend", &[], &[], &decisions, None)
            .unwrap();

        assert_eq!(ids(&outcome.decisions, |d| &d.id), vec!["d-strong"]);
        assert_eq!(outcome.result.decisions_removed, 1);
        assert_eq!(
            outcome.result.reasons.get(&PruneReason::NegativeOutcome),
            Some(&1)
        );
    }

    // -------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------

    fn enabled_service() -> PruningService {
        PruningService::new(PruningConfig {
            enabled: true,
            ..PruningConfig::default()
        })
        .unwrap()
    }

    fn counting_callback(
        counter: Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<Result<(), String>> + Send + Sync + 'static {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[test]
    fn test_start_without_runtime_reports_no_runtime() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(
            svc.start_scheduled_pruning(counting_callback(counter)),
            ScheduleStart::NoRuntime
        );
        assert!(!svc.is_scheduled());
    }

    #[tokio::test]
    async fn test_start_is_gated_by_enabled() {
        let mut svc = service();
        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(
            svc.start_scheduled_pruning(counting_callback(counter)),
            ScheduleStart::Disabled
        );
        assert!(!svc.is_scheduled());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_safe() {
        let mut svc = enabled_service();
        assert!(!svc.stop_scheduled_pruning());
        assert!(!svc.stop_scheduled_pruning());
    }

    #[tokio::test]
    async fn test_scheduled_callback_runs_periodically() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        let started =
            svc.start_with_period(Duration::from_millis(20), counting_callback(counter.clone()));
        assert_eq!(started, ScheduleStart::Started);
        assert!(svc.is_scheduled());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);

        assert!(svc.stop_scheduled_pruning());
        assert!(!svc.is_scheduled());
    }

    #[tokio::test]
    async fn test_double_start_creates_one_timer() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        assert_eq!(
            svc.start_with_period(Duration::from_millis(20), counting_callback(counter.clone())),
            ScheduleStart::Started
        );
        assert_eq!(
            svc.start_with_period(Duration::from_millis(20), counting_callback(counter.clone())),
            ScheduleStart::AlreadyRunning
        );
        assert_eq!(
            svc.start_scheduled_pruning(counting_callback(counter.clone())),
            ScheduleStart::AlreadyRunning
        );

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(svc.stop_scheduled_pruning());

        // With a single timer, stopping it once silences the schedule.
        tokio::time::sleep(Duration::from_millis(40)).await;
        let after_stop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_first_tick_waits_a_full_period() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        svc.start_with_period(Duration::from_secs(3600), counting_callback(counter.clone()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        svc.stop_scheduled_pruning();
    }

    #[tokio::test]
    async fn test_failing_callback_keeps_schedule_alive() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        svc.start_with_period(Duration::from_millis(15), move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err::<(), _>("disk full"))
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);
        assert!(svc.is_scheduled());
        svc.stop_scheduled_pruning();
    }

    #[tokio::test]
    async fn test_disabling_via_update_stops_schedule() {
        let mut svc = enabled_service();
        let counter = Arc::new(AtomicUsize::new(0));
        svc.start_with_period(Duration::from_millis(20), counting_callback(counter));
        assert!(svc.is_scheduled());

        svc.update_config(&PruningConfigUpdate {
            enabled: Some(false),
            ..PruningConfigUpdate::default()
        })
        .unwrap();
        assert!(!svc.is_scheduled());
    }

    #[tokio::test]
    async fn test_scheduled_callback_can_prune_under_agent_lock() {
        let mut svc = enabled_service();
        let locks = svc.agent_locks();
        let pruned = Arc::new(AtomicUsize::new(0));
        let prune_svc = Arc::new(PruningService::new(PruningConfig::default()).unwrap());

        let p = pruned.clone();
        svc.start_with_period(Duration::from_millis(20), move || {
            let locks = locks.clone();
            let prune_svc = prune_svc.clone();
            let p = p.clone();
            async move {
                let _guard = locks.lock("backend").await;
                let (patterns, solutions, decisions) = fixture();
                let outcome =
                    prune_svc.prune_at(now(), "backend", &patterns, &solutions, &decisions, None)?;
                p.fetch_add(outcome.result.total_removed(), Ordering::SeqCst);
                Ok::<(), ConfigurationError>(())
            }
        });

        // While the manual side holds the lock, scheduled runs must wait.
        let guard = svc.agent_locks().lock("backend").await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(pruned.load(Ordering::SeqCst), 0);
        drop(guard);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(pruned.load(Ordering::SeqCst) >= 5);
        svc.stop_scheduled_pruning();
    }
}

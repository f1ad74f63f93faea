//! Rolling P95 baseline of daily follower deltas used to normalize
//! follow-through.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use pulse_cache::TtlCache;
use pulse_core::config::RewardConfig;
use pulse_core::KernelResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BASELINE_KEY: &str = "follower_delta_p95";

/// Source of historical daily follower deltas.
pub trait FollowerHistory: Send + Sync {
    /// One value per day since `since`, in any order.
    fn daily_follower_deltas(&self, since: DateTime<Utc>) -> KernelResult<Vec<f64>>;
}

/// 95th percentile by the nearest-rank rule `sorted[floor(0.95 * n)]`.
/// Non-finite values are ignored. `None` for an empty series.
pub fn p95(deltas: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = deltas.iter().copied().filter(|d| d.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let idx = ((0.95 * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

pub struct FollowerBaseline {
    history: Arc<dyn FollowerHistory>,
    cache: Arc<TtlCache<String, f64>>,
    config: RewardConfig,
}

impl FollowerBaseline {
    pub fn new(
        history: Arc<dyn FollowerHistory>,
        cache: Arc<TtlCache<String, f64>>,
        config: RewardConfig,
    ) -> Self {
        Self {
            history,
            cache,
            config,
        }
    }

    /// Current baseline. Recomputed when absent or stale; a history failure
    /// yields the configured default without caching it.
    pub fn current(&self) -> f64 {
        let ttl = Duration::from_secs(self.config.baseline_ttl_secs);
        match self
            .cache
            .get_or_insert_with(BASELINE_KEY.to_string(), ttl, || self.compute())
        {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!(error = %e, default = self.config.default_baseline, "follower history unavailable, using default baseline");
                self.config.default_baseline
            }
        }
    }

    fn compute(&self) -> KernelResult<f64> {
        let since = Utc::now() - ChronoDuration::days(self.config.baseline_lookback_days);
        let deltas = self.history.daily_follower_deltas(since)?;

        if deltas.len() < self.config.min_history_days {
            debug!(
                days = deltas.len(),
                required = self.config.min_history_days,
                "insufficient follower history, using default baseline"
            );
            return Ok(self.config.default_baseline);
        }

        let baseline = match p95(&deltas) {
            Some(v) if v > 0.0 => v,
            _ => self.config.default_baseline,
        };
        debug!(days = deltas.len(), baseline, "follower baseline recomputed");
        Ok(baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::KernelError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHistory {
        deltas: Vec<f64>,
        calls: AtomicUsize,
    }

    impl FollowerHistory for CountingHistory {
        fn daily_follower_deltas(&self, _since: DateTime<Utc>) -> KernelResult<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.deltas.clone())
        }
    }

    struct BrokenHistory;

    impl FollowerHistory for BrokenHistory {
        fn daily_follower_deltas(&self, _since: DateTime<Utc>) -> KernelResult<Vec<f64>> {
            Err(KernelError::Persistence("connection refused".into()))
        }
    }

    fn config() -> RewardConfig {
        RewardConfig {
            min_history_days: 5,
            default_baseline: 25.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_p95_nearest_rank() {
        assert_eq!(p95(&[]), None);
        assert_eq!(p95(&[7.0]), Some(7.0));
        let values: Vec<f64> = (0..100).map(f64::from).rev().collect();
        assert_eq!(p95(&values), Some(95.0));
        assert_eq!(p95(&[f64::NAN, 3.0, 1.0]), Some(3.0));
    }

    #[test]
    fn test_baseline_cached_between_calls() {
        let history = Arc::new(CountingHistory {
            deltas: (1..=40).map(f64::from).collect(),
            calls: AtomicUsize::new(0),
        });
        let baseline = FollowerBaseline::new(history.clone(), Arc::new(TtlCache::new(4)), config());
        assert_eq!(baseline.current(), 39.0);
        assert_eq!(baseline.current(), 39.0);
        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_baseline_is_recomputed() {
        let history = Arc::new(CountingHistory {
            deltas: (1..=40).map(f64::from).collect(),
            calls: AtomicUsize::new(0),
        });
        let cfg = RewardConfig {
            baseline_ttl_secs: 0,
            ..config()
        };
        let baseline = FollowerBaseline::new(history.clone(), Arc::new(TtlCache::new(4)), cfg);
        baseline.current();
        baseline.current();
        assert_eq!(history.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_short_history_uses_default() {
        let history = Arc::new(CountingHistory {
            deltas: vec![500.0, 600.0],
            calls: AtomicUsize::new(0),
        });
        let baseline = FollowerBaseline::new(history, Arc::new(TtlCache::new(4)), config());
        assert_eq!(baseline.current(), 25.0);
    }

    #[test]
    fn test_non_positive_p95_uses_default() {
        let history = Arc::new(CountingHistory {
            deltas: vec![-3.0, -1.0, 0.0, -2.0, -5.0, 0.0],
            calls: AtomicUsize::new(0),
        });
        let baseline = FollowerBaseline::new(history, Arc::new(TtlCache::new(4)), config());
        assert_eq!(baseline.current(), 25.0);
    }

    #[test]
    fn test_history_failure_falls_back_uncached() {
        let cache = Arc::new(TtlCache::new(4));
        let baseline = FollowerBaseline::new(Arc::new(BrokenHistory), cache.clone(), config());
        assert_eq!(baseline.current(), 25.0);
        assert!(cache.is_empty());
    }
}

//! Bandit arms, composite arm ids and the pure reward reducer.

use chrono::{DateTime, Utc};
use pulse_core::config::BetaPrior;
use pulse_core::{KernelError, KernelResult, Scope};
use serde::{Deserialize, Serialize};

/// Separator between dimension values in content and reply arm ids.
pub const ARM_DELIMITER: &str = "|";

/// Number of leading dimensions shared by arms of one group.
pub const GROUP_DEPTH: usize = 2;

/// Smallest Beta shape ever used. Keeps the distribution well-defined even
/// when a misconfigured prior is zero or negative.
pub const MIN_SHAPE: f64 = 1e-3;

/// Per-arm sufficient statistics and Beta posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditArm {
    pub arm_id: String,
    pub scope: Scope,
    pub trials: u64,
    /// Sum of rewards clamped to [0, 1]; a fractional success per trial.
    pub successes: f64,
    pub alpha: f64,
    pub beta: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl BanditArm {
    /// A never-rewarded arm sitting at the prior.
    pub fn new(arm_id: impl Into<String>, scope: Scope, prior: BetaPrior, now: DateTime<Utc>) -> Self {
        let mut arm = Self {
            arm_id: arm_id.into(),
            scope,
            trials: 0,
            successes: 0.0,
            alpha: 0.0,
            beta: 0.0,
            created_at: now,
            last_updated: now,
        };
        arm.recompute_posterior(prior);
        arm
    }

    /// Return the arm after one more trial with the given reward.
    ///
    /// Each reward counts as exactly one trial; the reward, clamped to [0, 1],
    /// is the fractional success. Alpha and beta are recomputed from the
    /// counters rather than incremented.
    pub fn with_reward(&self, reward: f64, prior: BetaPrior, now: DateTime<Utc>) -> KernelResult<Self> {
        if !reward.is_finite() {
            return Err(KernelError::InvalidReward {
                arm_id: self.arm_id.clone(),
                reward,
            });
        }
        let mut next = self.clone();
        next.trials += 1;
        next.successes += reward.clamp(0.0, 1.0);
        next.last_updated = now;
        next.recompute_posterior(prior);
        Ok(next)
    }

    fn recompute_posterior(&mut self, prior: BetaPrior) {
        let failures = (self.trials as f64 - self.successes).max(0.0);
        self.alpha = prior.alpha.max(MIN_SHAPE) + self.successes;
        self.beta = prior.beta.max(MIN_SHAPE) + failures;
    }

    /// Empirical mean reward, 0 for an untried arm.
    pub fn mean_reward(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.successes / self.trials as f64
        }
    }

    pub fn posterior_mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn group_id(&self) -> String {
        group_id(&self.arm_id)
    }
}

/// Apply one reward to an arm, creating it at the prior if it was never seen.
pub fn apply_reward(
    existing: Option<&BanditArm>,
    arm_id: &str,
    scope: Scope,
    reward: f64,
    prior: BetaPrior,
    now: DateTime<Utc>,
) -> KernelResult<BanditArm> {
    match existing {
        Some(arm) => arm.with_reward(reward, prior, now),
        None => BanditArm::new(arm_id, scope, prior, now).with_reward(reward, prior, now),
    }
}

/// Lower-case, trimmed, whitespace collapsed to `_`, delimiters removed.
pub fn normalize_dimension(value: &str) -> String {
    value
        .split_whitespace()
        .map(|part| part.replace(ARM_DELIMITER, "").to_lowercase())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Composite id for content and reply arms, e.g. `single|bold_claim|sleep`.
pub fn content_arm_id(dimensions: &[&str]) -> String {
    dimensions
        .iter()
        .map(|d| normalize_dimension(d))
        .collect::<Vec<_>>()
        .join(ARM_DELIMITER)
}

/// Timing arm id `hour-dayOfWeek`.
pub fn timing_arm_id(hour: u32, day_of_week: u32) -> String {
    format!("{hour}-{day_of_week}")
}

/// Every timing arm id for the given hours and days.
pub fn timing_candidates(hours: &[u32], days: &[u32]) -> Vec<String> {
    days.iter()
        .flat_map(|d| hours.iter().map(move |h| timing_arm_id(*h, *d)))
        .collect()
}

/// The first `GROUP_DEPTH` segments of an arm id.
pub fn group_id(arm_id: &str) -> String {
    arm_id
        .split(ARM_DELIMITER)
        .take(GROUP_DEPTH)
        .collect::<Vec<_>>()
        .join(ARM_DELIMITER)
}

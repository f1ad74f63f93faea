//! Bandit Selector: Thompson Sampling (content, reply) and UCB1 (timing)
//! over arms held in an `ArmStore`, with optional hierarchical shrinkage.

use chrono::Utc;
use pulse_cache::TtlCache;
use pulse_core::config::{BanditConfig, BetaPrior};
use pulse_core::{ArmSelection, KernelError, KernelResult, Scope, SelectionAlgorithm};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::arm::{apply_reward, group_id, BanditArm};
use crate::hierarchy::{group_priors, shrink, GroupPrior};
use crate::sampling::beta_sample;
use crate::store::ArmStore;

/// Expected reward reported for a neutral fallback selection.
pub const NEUTRAL_REWARD: f64 = 0.5;

pub type GroupPriorCache = TtlCache<(Scope, String), GroupPrior>;

/// Where the Beta parameters used for a Thompson draw came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    ScopePrior,
    Posterior,
    GroupPrior,
    Shrunk,
}

impl ParamSource {
    fn as_str(&self) -> &'static str {
        match self {
            ParamSource::ScopePrior => "scope prior",
            ParamSource::Posterior => "arm posterior",
            ParamSource::GroupPrior => "group prior",
            ParamSource::Shrunk => "shrunk posterior",
        }
    }
}

/// Effective Beta parameters for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub alpha: f64,
    pub beta: f64,
    pub source: ParamSource,
}

impl SamplingParams {
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmStats {
    pub arm_id: String,
    pub trials: u64,
    pub successes: f64,
    pub mean_reward: f64,
    pub posterior_mean: f64,
    pub confidence_interval_lower: f64,
    pub confidence_interval_upper: f64,
    pub traffic_share: f64,
    pub is_leader: bool,
}

pub struct BanditSelector {
    store: Arc<dyn ArmStore>,
    group_cache: Arc<GroupPriorCache>,
    config: BanditConfig,
}

impl BanditSelector {
    pub fn new(store: Arc<dyn ArmStore>, group_cache: Arc<GroupPriorCache>, config: BanditConfig) -> Self {
        Self {
            store,
            group_cache,
            config,
        }
    }

    pub fn config(&self) -> &BanditConfig {
        &self.config
    }

    /// Pick one of `candidates` for `scope`.
    ///
    /// An empty candidate list is a contract violation. A store read failure
    /// yields a neutral selection of the first candidate.
    pub fn select<S: AsRef<str>>(&self, scope: Scope, candidates: &[S]) -> KernelResult<ArmSelection> {
        self.select_with_rng(scope, candidates, &mut rand::thread_rng())
    }

    pub fn select_with_rng<S: AsRef<str>, R: Rng>(
        &self,
        scope: Scope,
        candidates: &[S],
        rng: &mut R,
    ) -> KernelResult<ArmSelection> {
        if candidates.is_empty() {
            return Err(KernelError::EmptyCandidates);
        }

        let arms = match self.store.load(scope) {
            Ok(arms) => arms,
            Err(e) => {
                warn!(scope = %scope, error = %e, "arm store unavailable, neutral selection");
                metrics::counter!("pulse.bandit.fallback", "scope" => scope.as_str()).increment(1);
                return Ok(neutral_selection(scope, candidates[0].as_ref(), &e));
            }
        };

        let selection = match scope.algorithm() {
            SelectionAlgorithm::ThompsonSampling => {
                self.thompson_sampling(scope, candidates, &arms, rng)
            }
            SelectionAlgorithm::Ucb1 => self.ucb1(scope, candidates, &arms),
        };

        debug!(
            scope = %scope,
            arm_id = %selection.arm_id,
            expected_reward = selection.expected_reward,
            candidates = candidates.len(),
            "arm selected"
        );
        Ok(selection)
    }

    fn thompson_sampling<S: AsRef<str>, R: Rng>(
        &self,
        scope: Scope,
        candidates: &[S],
        arms: &[BanditArm],
        rng: &mut R,
    ) -> ArmSelection {
        let by_id: HashMap<&str, &BanditArm> = arms.iter().map(|a| (a.arm_id.as_str(), a)).collect();
        let mut groups: HashMap<String, Option<GroupPrior>> = HashMap::new();

        let mut best_sample = f64::NEG_INFINITY;
        let mut best: Option<(&str, SamplingParams)> = None;

        for candidate in candidates {
            let arm_id = candidate.as_ref();
            let arm = by_id.get(arm_id).copied();
            let params = self.effective_params(scope, arm_id, arm, arms, &mut groups);

            let sample = beta_sample(rng, params.alpha, params.beta);
            if sample > best_sample {
                best_sample = sample;
                best = Some((arm_id, params));
            }
        }

        // Candidates are non-empty and every sample is finite.
        let (arm_id, params) = best.unwrap_or_else(|| {
            (
                candidates[0].as_ref(),
                self.prior_params(scope),
            )
        });

        ArmSelection {
            arm_id: arm_id.to_string(),
            expected_reward: params.mean(),
            algorithm: SelectionAlgorithm::ThompsonSampling,
            reason: format!(
                "thompson sample {:.4} from {} Beta({:.2}, {:.2})",
                best_sample,
                params.source.as_str(),
                params.alpha,
                params.beta
            ),
        }
    }

    fn ucb1<S: AsRef<str>>(&self, scope: Scope, candidates: &[S], arms: &[BanditArm]) -> ArmSelection {
        let by_id: HashMap<&str, &BanditArm> = arms.iter().map(|a| (a.arm_id.as_str(), a)).collect();
        let observed = |id: &str| by_id.get(id).copied().filter(|a| a.trials > 0);

        // Only the candidate set counts towards the exploration term.
        let total_trials: u64 = candidates
            .iter()
            .filter_map(|c| observed(c.as_ref()))
            .map(|a| a.trials)
            .sum();
        let log_total = (total_trials.max(1) as f64).ln();

        let mut best_score = f64::NEG_INFINITY;
        let mut best: Option<(&str, Option<&BanditArm>)> = None;

        for candidate in candidates {
            let arm_id = candidate.as_ref();
            let arm = observed(arm_id);
            let score = match arm {
                None => f64::INFINITY,
                Some(a) => {
                    a.mean_reward()
                        + self.config.ucb_exploration * (log_total / a.trials as f64).sqrt()
                }
            };
            if score > best_score {
                best_score = score;
                best = Some((arm_id, arm));
            }
        }

        let (arm_id, arm) = best.unwrap_or((candidates[0].as_ref(), None));
        match arm {
            None => ArmSelection {
                arm_id: arm_id.to_string(),
                expected_reward: self.config.prior(scope).mean(),
                algorithm: SelectionAlgorithm::Ucb1,
                reason: "unobserved arm explored first".to_string(),
            },
            Some(a) => ArmSelection {
                arm_id: arm_id.to_string(),
                expected_reward: a.mean_reward(),
                algorithm: SelectionAlgorithm::Ucb1,
                reason: format!(
                    "ucb1 score {:.4} (mean {:.4} over {} trials of {})",
                    best_score,
                    a.mean_reward(),
                    a.trials,
                    total_trials
                ),
            },
        }
    }

    fn prior_params(&self, scope: Scope) -> SamplingParams {
        let BetaPrior { alpha, beta } = self.config.prior(scope);
        SamplingParams {
            alpha,
            beta,
            source: ParamSource::ScopePrior,
        }
    }

    fn effective_params(
        &self,
        scope: Scope,
        arm_id: &str,
        arm: Option<&BanditArm>,
        arms: &[BanditArm],
        groups: &mut HashMap<String, Option<GroupPrior>>,
    ) -> SamplingParams {
        let shrinkage = &self.config.shrinkage;
        if !shrinkage.enabled {
            return match arm {
                Some(a) => SamplingParams {
                    alpha: a.alpha,
                    beta: a.beta,
                    source: ParamSource::Posterior,
                },
                None => self.prior_params(scope),
            };
        }

        let gid = group_id(arm_id);
        let group = groups
            .entry(gid.clone())
            .or_insert_with(|| self.lookup_group(scope, &gid, arms))
            .clone();

        match (arm, group) {
            (Some(a), Some(g)) if a.trials >= shrinkage.min_trials => {
                let (alpha, beta) = shrink(a.alpha, a.beta, &g, shrinkage.weight);
                SamplingParams {
                    alpha,
                    beta,
                    source: ParamSource::Shrunk,
                }
            }
            (_, Some(g)) => SamplingParams {
                alpha: g.alpha,
                beta: g.beta,
                source: ParamSource::GroupPrior,
            },
            (Some(a), None) => SamplingParams {
                alpha: a.alpha,
                beta: a.beta,
                source: ParamSource::Posterior,
            },
            (None, None) => self.prior_params(scope),
        }
    }

    /// Cached group prior, recomputing every group of the scope on a miss.
    fn lookup_group(&self, scope: Scope, gid: &str, arms: &[BanditArm]) -> Option<GroupPrior> {
        let key = (scope, gid.to_string());
        if let Some(group) = self.group_cache.get(&key) {
            return Some(group);
        }

        let ttl = Duration::from_secs(self.config.shrinkage.group_prior_ttl_secs);
        let mut computed = group_priors(arms, self.config.prior(scope));
        for (id, group) in &computed {
            self.group_cache.put((scope, id.clone()), group.clone(), ttl);
        }
        debug!(scope = %scope, groups = computed.len(), "group priors recomputed");
        computed.remove(gid)
    }

    /// Group prior for `group_id`, computed from the store when not cached.
    pub fn group_prior(&self, scope: Scope, group_id: &str) -> KernelResult<Option<GroupPrior>> {
        let arms = self.store.load(scope)?;
        Ok(self.lookup_group(scope, group_id, &arms))
    }

    /// Beta parameters a Thompson draw for `arm_id` would use right now.
    pub fn sampling_params(&self, scope: Scope, arm_id: &str) -> KernelResult<SamplingParams> {
        let arms = self.store.load(scope)?;
        let arm = arms.iter().find(|a| a.arm_id == arm_id);
        let mut groups = HashMap::new();
        Ok(self.effective_params(scope, arm_id, arm, &arms, &mut groups))
    }

    /// Read-modify-write one reward into the arm's statistics.
    pub fn record_reward(&self, scope: Scope, arm_id: &str, reward: f64) -> KernelResult<BanditArm> {
        let prior = self.config.prior(scope);
        let existing = self.store.get(scope, arm_id)?;
        let updated = apply_reward(existing.as_ref(), arm_id, scope, reward, prior, Utc::now())?;
        self.store.upsert(&updated)?;
        self.group_cache.invalidate(&(scope, group_id(arm_id)));

        info!(
            scope = %scope,
            arm_id,
            reward,
            trials = updated.trials,
            alpha = updated.alpha,
            beta = updated.beta,
            "arm updated"
        );
        Ok(updated)
    }

    /// Per-arm summary for a scope, ordered by arm id.
    pub fn arm_stats(&self, scope: Scope) -> KernelResult<Vec<ArmStats>> {
        let arms = self.store.load(scope)?;
        let total_trials: u64 = arms.iter().map(|a| a.trials).sum();

        let leader = arms
            .iter()
            .filter(|a| a.trials >= self.config.shrinkage.min_trials)
            .max_by(|a, b| {
                a.posterior_mean()
                    .partial_cmp(&b.posterior_mean())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|a| a.arm_id.clone());

        let stats = arms
            .iter()
            .map(|arm| {
                let mean = arm.mean_reward();
                let ci_width = if arm.trials > 0 {
                    1.96 * (mean * (1.0 - mean) / arm.trials as f64).max(0.0).sqrt()
                } else {
                    0.5
                };
                let traffic_share = if total_trials > 0 {
                    arm.trials as f64 / total_trials as f64
                } else {
                    1.0 / arms.len() as f64
                };
                ArmStats {
                    arm_id: arm.arm_id.clone(),
                    trials: arm.trials,
                    successes: arm.successes,
                    mean_reward: mean,
                    posterior_mean: arm.posterior_mean(),
                    confidence_interval_lower: (mean - ci_width).max(0.0),
                    confidence_interval_upper: (mean + ci_width).min(1.0),
                    traffic_share,
                    is_leader: leader.as_deref() == Some(arm.arm_id.as_str()),
                }
            })
            .collect();
        Ok(stats)
    }
}

fn neutral_selection(scope: Scope, arm_id: &str, error: &KernelError) -> ArmSelection {
    ArmSelection {
        arm_id: arm_id.to_string(),
        expected_reward: NEUTRAL_REWARD,
        algorithm: scope.algorithm(),
        reason: format!("neutral fallback: {error}"),
    }
}

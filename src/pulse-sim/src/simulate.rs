//! Closed-loop simulations: select, observe synthetic engagement, reduce to
//! a reward and feed it back.

use pulse_core::{KernelResult, Scope};
use pulse_predictor::{top_features, PredictionTarget};
use pulse_rl_engine::{content_arm_id, timing_candidates, ArmStats};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::kernel::Kernel;
use crate::synthetic::{
    arm_metadata, engagement_counters, true_engagement_rate, SIM_FORMATS, SIM_HOOKS, SIM_TOPICS,
};

pub const SIM_HOURS: &[u32] = &[7, 10, 12, 15, 18, 22];
pub const SIM_DAYS: &[u32] = &[1, 3, 5];

#[derive(Debug, Clone, Serialize)]
pub struct BanditReport {
    pub scope: Scope,
    pub rounds: usize,
    pub picks: BTreeMap<String, u64>,
    /// Candidate with the highest true engagement rate.
    pub best_arm: String,
    pub best_arm_share: f64,
    pub mean_reward: f64,
    pub stats: Vec<ArmStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub target: PredictionTarget,
    pub version: Option<u32>,
    pub samples: Option<usize>,
    pub top_features: Vec<(String, f64)>,
    pub error: Option<String>,
}

pub fn content_candidates() -> Vec<String> {
    let mut ids = Vec::new();
    for format in SIM_FORMATS {
        for hook in SIM_HOOKS {
            for topic in SIM_TOPICS {
                ids.push(content_arm_id(&[*format, *hook, *topic]));
            }
        }
    }
    ids
}

fn timing_rate(arm_id: &str) -> f64 {
    let hour: u32 = arm_id
        .split('-')
        .next()
        .and_then(|h| h.parse().ok())
        .unwrap_or(0);
    match hour {
        18 => 0.05,
        12 => 0.04,
        7 => 0.035,
        _ => 0.02,
    }
}

fn best_of<F: Fn(&str) -> f64>(candidates: &[String], rate: F) -> String {
    let mut best = candidates.first().cloned().unwrap_or_default();
    let mut best_rate = f64::NEG_INFINITY;
    for c in candidates {
        let r = rate(c);
        if r > best_rate {
            best_rate = r;
            best = c.clone();
        }
    }
    best
}

/// Run `rounds` select/observe/update cycles for `scope`.
pub fn run_bandit<R: Rng>(kernel: &Kernel, scope: Scope, rounds: usize, rng: &mut R) -> KernelResult<BanditReport> {
    let candidates = match scope {
        Scope::Timing => timing_candidates(SIM_HOURS, SIM_DAYS),
        _ => content_candidates(),
    };
    let rate = |arm_id: &str| match scope {
        Scope::Timing => timing_rate(arm_id),
        _ => true_engagement_rate(&arm_metadata(arm_id)),
    };

    let mut picks: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_reward = 0.0;

    for _ in 0..rounds {
        let selection = kernel.selector.select_with_rng(scope, &candidates, rng)?;
        let counters = engagement_counters(rng, rate(&selection.arm_id));
        let metrics = kernel.rewards.reduce(&counters);
        let reward = match scope {
            Scope::Reply => metrics.reply_reward,
            _ => metrics.post_reward,
        };
        kernel.selector.record_reward(scope, &selection.arm_id, reward)?;

        total_reward += reward;
        *picks.entry(selection.arm_id).or_insert(0) += 1;
    }

    let best_arm = best_of(&candidates, rate);
    let best_picks = picks.get(&best_arm).copied().unwrap_or(0);
    let report = BanditReport {
        scope,
        rounds,
        best_arm_share: if rounds > 0 { best_picks as f64 / rounds as f64 } else { 0.0 },
        mean_reward: if rounds > 0 { total_reward / rounds as f64 } else { 0.0 },
        picks,
        best_arm,
        stats: kernel.selector.arm_stats(scope)?,
    };

    info!(
        scope = %scope,
        rounds,
        best_arm = %report.best_arm,
        best_arm_share = report.best_arm_share,
        mean_reward = report.mean_reward,
        "bandit simulation finished"
    );
    Ok(report)
}

/// Train every target and summarize the outcome.
pub fn run_training(kernel: &Kernel, top_k: usize) -> Vec<TrainingReport> {
    kernel
        .trainer
        .train_all()
        .into_iter()
        .map(|(target, result)| match result {
            Ok(model) => TrainingReport {
                target,
                version: Some(model.version),
                samples: Some(model.training_samples),
                top_features: top_features(&model, top_k),
                error: None,
            },
            Err(e) => {
                warn!(target = target.as_str(), error = %e, "training failed");
                TrainingReport {
                    target,
                    version: None,
                    samples: None,
                    top_features: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

//! Empirical-Bayes group priors for hierarchical shrinkage.
//!
//! A group is every arm sharing the first two id segments. Its prior is the
//! scope prior plus the average sufficient statistics of the group's arms,
//! i.e. the posterior of a "typical" arm in that group.

use pulse_core::config::BetaPrior;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::arm::{group_id, BanditArm, MIN_SHAPE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPrior {
    pub group_id: String,
    pub alpha: f64,
    pub beta: f64,
    /// Number of arms contributing.
    pub count: usize,
}

impl GroupPrior {
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

/// Group priors for every group with at least one tried arm.
pub fn group_priors(arms: &[BanditArm], prior: BetaPrior) -> HashMap<String, GroupPrior> {
    let mut totals: HashMap<String, (f64, f64, usize)> = HashMap::new();
    for arm in arms.iter().filter(|a| a.trials > 0) {
        let entry = totals.entry(arm.group_id()).or_insert((0.0, 0.0, 0));
        entry.0 += arm.successes;
        entry.1 += (arm.trials as f64 - arm.successes).max(0.0);
        entry.2 += 1;
    }

    totals
        .into_iter()
        .map(|(id, (successes, failures, count))| {
            let n = count as f64;
            let group = GroupPrior {
                group_id: id.clone(),
                alpha: prior.alpha.max(MIN_SHAPE) + successes / n,
                beta: prior.beta.max(MIN_SHAPE) + failures / n,
                count,
            };
            (id, group)
        })
        .collect()
}

/// Prior for a single group, if any tried arm belongs to it.
pub fn group_prior_for(arms: &[BanditArm], prior: BetaPrior, group: &str) -> Option<GroupPrior> {
    let members: Vec<BanditArm> = arms
        .iter()
        .filter(|a| group_id(&a.arm_id) == group)
        .cloned()
        .collect();
    group_priors(&members, prior).remove(group)
}

/// `(1 - w) * arm + w * group`, component-wise on `(alpha, beta)`.
pub fn shrink(alpha: f64, beta: f64, group: &GroupPrior, weight: f64) -> (f64, f64) {
    let w = weight.clamp(0.0, 1.0);
    (
        ((1.0 - w) * alpha + w * group.alpha).max(MIN_SHAPE),
        ((1.0 - w) * beta + w * group.beta).max(MIN_SHAPE),
    )
}

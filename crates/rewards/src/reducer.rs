//! Engagement counters → bounded scalar rewards.

use pulse_core::types::EngagementCounters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::baseline::FollowerBaseline;

pub const LIKE_WEIGHT: f64 = 0.4;
pub const REPOST_WEIGHT: f64 = 0.3;
pub const REPLY_WEIGHT: f64 = 0.2;
pub const BOOKMARK_WEIGHT: f64 = 0.1;

pub const POST_ER_WEIGHT: f64 = 0.6;
pub const POST_FOLLOW_WEIGHT: f64 = 0.4;

/// Bonus per interaction from a non-follower on a reply.
pub const NONFOLLOWER_BONUS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardMetrics {
    pub er_weighted: f64,
    pub follow_through: f64,
    pub post_reward: f64,
    /// Open-ended: the non-follower term is a bonus, not a rate.
    pub reply_reward: f64,
    pub new_nonfollower_interactors: u64,
}

/// Weighted engagement rate in [0, 1]. Impressions are floored at 1.
pub fn er_weighted(counters: &EngagementCounters) -> f64 {
    let weighted = LIKE_WEIGHT * counters.likes as f64
        + REPOST_WEIGHT * counters.reposts as f64
        + REPLY_WEIGHT * counters.replies as f64
        + BOOKMARK_WEIGHT * counters.bookmarks as f64;
    (weighted / counters.impressions.max(1) as f64).clamp(0.0, 1.0)
}

/// Follower delta relative to the P95 baseline, clipped to [0, 1].
pub fn follow_through(followers_delta_24h: f64, baseline: f64) -> f64 {
    if !followers_delta_24h.is_finite() || !baseline.is_finite() || baseline <= 0.0 {
        return 0.0;
    }
    (followers_delta_24h / baseline).clamp(0.0, 1.0)
}

pub fn post_reward(er_weighted: f64, follow_through: f64) -> f64 {
    POST_ER_WEIGHT * er_weighted + POST_FOLLOW_WEIGHT * follow_through
}

pub fn reply_reward(er_weighted: f64, nonfollower_interactions: u64) -> f64 {
    er_weighted + NONFOLLOWER_BONUS * nonfollower_interactions as f64
}

/// Reduces raw counters to rewards using a shared follower baseline.
pub struct RewardReducer {
    baseline: Arc<FollowerBaseline>,
}

impl RewardReducer {
    pub fn new(baseline: Arc<FollowerBaseline>) -> Self {
        Self { baseline }
    }

    pub fn reduce(&self, counters: &EngagementCounters) -> RewardMetrics {
        let er = er_weighted(counters);
        let follow = match counters.followers_delta_24h {
            Some(delta) => follow_through(delta as f64, self.baseline.current()),
            None => 0.0,
        };
        let nonfollowers = counters.interactions_from_nonfollowers.unwrap_or(0);

        let metrics = RewardMetrics {
            er_weighted: er,
            follow_through: follow,
            post_reward: post_reward(er, follow),
            reply_reward: reply_reward(er, nonfollowers),
            new_nonfollower_interactors: nonfollowers,
        };
        debug!(
            er_weighted = metrics.er_weighted,
            follow_through = metrics.follow_through,
            post_reward = metrics.post_reward,
            "engagement reduced"
        );
        metrics
    }
}

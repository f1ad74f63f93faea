//! Reward reduction: normalizes raw engagement counters into bounded scalar
//! rewards that feed bandit arm updates.

pub mod baseline;
pub mod reducer;

pub use baseline::{p95, FollowerBaseline, FollowerHistory};
pub use reducer::{
    er_weighted, follow_through, post_reward, reply_reward, RewardMetrics, RewardReducer,
};

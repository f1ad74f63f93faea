//! Bandit engine: per-arm Beta posteriors, Thompson Sampling for content
//! and reply choices, UCB1 for posting times, and hierarchical shrinkage of
//! sparse arms toward their group.

pub mod arm;
pub mod bandits;
pub mod hierarchy;
pub mod sampling;
pub mod store;

pub use arm::{apply_reward, content_arm_id, group_id, timing_arm_id, timing_candidates, BanditArm};
pub use bandits::{ArmStats, BanditSelector, GroupPriorCache, ParamSource, SamplingParams};
pub use hierarchy::GroupPrior;
pub use store::{ArmStore, InMemoryArmStore};

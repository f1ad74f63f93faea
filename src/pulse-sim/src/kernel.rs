//! Wires the kernel components over in-memory collaborators.

use pulse_cache::TtlCache;
use pulse_core::KernelConfig;
use pulse_predictor::{InMemoryModelRepository, ModelRegistry, ModelTrainer, Predictor, TrainingDataSource};
use pulse_rewards::{FollowerBaseline, FollowerHistory, RewardReducer};
use pulse_rl_engine::{BanditSelector, InMemoryArmStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const GROUP_PRIOR_CACHE_ENTRIES: usize = 10_000;
const BASELINE_CACHE_ENTRIES: usize = 16;

pub struct Kernel {
    pub config: KernelConfig,
    pub arms: Arc<InMemoryArmStore>,
    pub selector: BanditSelector,
    pub baseline: Arc<FollowerBaseline>,
    pub rewards: RewardReducer,
    pub registry: Arc<ModelRegistry>,
    pub trainer: ModelTrainer,
    pub predictor: Predictor,
}

impl Kernel {
    pub fn new(
        config: KernelConfig,
        history: Arc<dyn FollowerHistory>,
        training: Arc<dyn TrainingDataSource>,
    ) -> Self {
        let arms = Arc::new(InMemoryArmStore::new());
        let selector = BanditSelector::new(
            arms.clone(),
            Arc::new(TtlCache::new(GROUP_PRIOR_CACHE_ENTRIES)),
            config.bandit.clone(),
        );

        let baseline = Arc::new(FollowerBaseline::new(
            history,
            Arc::new(TtlCache::new(BASELINE_CACHE_ENTRIES)),
            config.reward.clone(),
        ));
        let rewards = RewardReducer::new(baseline.clone());

        let registry = Arc::new(ModelRegistry::new(
            Arc::new(InMemoryModelRepository::new()),
            Duration::from_secs(config.predictor.model_cache_ttl_secs),
        ));
        let trainer = ModelTrainer::new(training, registry.clone(), config.predictor.clone());
        let predictor = Predictor::new(registry.clone(), config.predictor.clone());

        info!(
            shrinkage = config.bandit.shrinkage.enabled,
            ucb_exploration = config.bandit.ucb_exploration,
            min_training_samples = config.predictor.min_training_samples,
            "Kernel initialized"
        );

        Self {
            config,
            arms,
            selector,
            baseline,
            rewards,
            registry,
            trainer,
            predictor,
        }
    }
}

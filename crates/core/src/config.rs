use serde::Deserialize;

use crate::types::Scope;

/// Root kernel configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `PULSE__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
}

/// Beta prior `(alpha0, beta0)` for arms that have never been rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BetaPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPrior {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

impl Default for BetaPrior {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanditConfig {
    #[serde(default)]
    pub content_prior: BetaPrior,
    #[serde(default)]
    pub reply_prior: BetaPrior,
    #[serde(default)]
    pub timing_prior: BetaPrior,
    /// UCB1 exploration constant `c`.
    #[serde(default = "default_ucb_exploration")]
    pub ucb_exploration: f64,
    #[serde(default)]
    pub shrinkage: ShrinkageConfig,
}

impl BanditConfig {
    pub fn prior(&self, scope: Scope) -> BetaPrior {
        match scope {
            Scope::Content => self.content_prior,
            Scope::Reply => self.reply_prior,
            Scope::Timing => self.timing_prior,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShrinkageConfig {
    #[serde(default = "default_shrinkage_enabled")]
    pub enabled: bool,
    /// Arms with fewer trials sample from the group prior directly.
    #[serde(default = "default_min_trials")]
    pub min_trials: u64,
    /// Mixing weight `w` in `(1 - w) * arm + w * group`.
    #[serde(default = "default_shrinkage_weight")]
    pub weight: f64,
    #[serde(default = "default_group_prior_ttl_secs")]
    pub group_prior_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_baseline_lookback_days")]
    pub baseline_lookback_days: i64,
    #[serde(default = "default_baseline_ttl_secs")]
    pub baseline_ttl_secs: u64,
    /// P95 follower delta used when history is too short to trust.
    #[serde(default = "default_baseline")]
    pub default_baseline: f64,
    #[serde(default = "default_min_history_days")]
    pub min_history_days: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_ridge_alpha")]
    pub ridge_alpha: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,
    #[serde(default = "default_min_training_samples")]
    pub min_training_samples: usize,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_model_cache_ttl_secs")]
    pub model_cache_ttl_secs: u64,
    /// Followers gained at or above this count label a post as "grew".
    #[serde(default = "default_follower_growth_threshold")]
    pub follower_growth_threshold: f64,
    #[serde(default = "default_engagement_rate")]
    pub default_engagement_rate: f64,
    #[serde(default = "default_follower_growth")]
    pub default_follower_growth: f64,
}

// Default functions
fn default_ucb_exploration() -> f64 {
    std::f64::consts::SQRT_2
}
fn default_shrinkage_enabled() -> bool {
    true
}
fn default_min_trials() -> u64 {
    5
}
fn default_shrinkage_weight() -> f64 {
    0.3
}
fn default_group_prior_ttl_secs() -> u64 {
    3600
}
fn default_baseline_lookback_days() -> i64 {
    90
}
fn default_baseline_ttl_secs() -> u64 {
    86_400
}
fn default_baseline() -> f64 {
    25.0
}
fn default_min_history_days() -> usize {
    14
}
fn default_ridge_alpha() -> f64 {
    1.0
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_max_iterations() -> usize {
    1000
}
fn default_gradient_tolerance() -> f64 {
    1e-4
}
fn default_min_training_samples() -> usize {
    20
}
fn default_lookback_days() -> i64 {
    30
}
fn default_model_cache_ttl_secs() -> u64 {
    3600
}
fn default_follower_growth_threshold() -> f64 {
    3.0
}
fn default_engagement_rate() -> f64 {
    0.02
}
fn default_follower_growth() -> f64 {
    0.10
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            content_prior: BetaPrior::default(),
            reply_prior: BetaPrior::default(),
            timing_prior: BetaPrior::default(),
            ucb_exploration: default_ucb_exploration(),
            shrinkage: ShrinkageConfig::default(),
        }
    }
}

impl Default for ShrinkageConfig {
    fn default() -> Self {
        Self {
            enabled: default_shrinkage_enabled(),
            min_trials: default_min_trials(),
            weight: default_shrinkage_weight(),
            group_prior_ttl_secs: default_group_prior_ttl_secs(),
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            baseline_lookback_days: default_baseline_lookback_days(),
            baseline_ttl_secs: default_baseline_ttl_secs(),
            default_baseline: default_baseline(),
            min_history_days: default_min_history_days(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            ridge_alpha: default_ridge_alpha(),
            learning_rate: default_learning_rate(),
            max_iterations: default_max_iterations(),
            gradient_tolerance: default_gradient_tolerance(),
            min_training_samples: default_min_training_samples(),
            lookback_days: default_lookback_days(),
            model_cache_ttl_secs: default_model_cache_ttl_secs(),
            follower_growth_threshold: default_follower_growth_threshold(),
            default_engagement_rate: default_engagement_rate(),
            default_follower_growth: default_follower_growth(),
        }
    }
}

impl KernelConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("PULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}

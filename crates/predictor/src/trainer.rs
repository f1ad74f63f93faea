//! Batch training of the engagement-rate and follower-growth models.

use chrono::{Duration, Utc};
use ndarray::Array1;
use pulse_core::config::PredictorConfig;
use pulse_core::{KernelError, KernelResult, TrainingSample};
use pulse_features::{FEATURE_NAMES, FEATURE_VERSION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::linalg::design_matrix;
use crate::logistic::{fit_logistic, GradientDescent};
use crate::model::{ModelType, PredictorModel};
use crate::registry::ModelRegistry;
use crate::ridge::{fit_ridge, LinearFit};

/// Quantity a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    /// Continuous engagement rate, ridge regression.
    EngagementRate,
    /// Probability of gaining at least the threshold in followers, logistic.
    FollowerGrowth,
}

impl PredictionTarget {
    pub const ALL: [PredictionTarget; 2] =
        [PredictionTarget::EngagementRate, PredictionTarget::FollowerGrowth];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionTarget::EngagementRate => "engagement_rate",
            PredictionTarget::FollowerGrowth => "follower_growth",
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            PredictionTarget::EngagementRate => ModelType::Ridge,
            PredictionTarget::FollowerGrowth => ModelType::Logistic,
        }
    }

    fn label(&self, sample: &TrainingSample, config: &PredictorConfig) -> f64 {
        match self {
            PredictionTarget::EngagementRate => {
                if sample.engagement_rate.is_finite() {
                    sample.engagement_rate
                } else {
                    0.0
                }
            }
            PredictionTarget::FollowerGrowth => {
                if sample.followers_gained >= config.follower_growth_threshold {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl std::fmt::Display for PredictionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of historical posts with realized outcomes.
pub trait TrainingDataSource: Send + Sync {
    fn samples_since(&self, since: chrono::DateTime<Utc>) -> KernelResult<Vec<TrainingSample>>;
}

/// Fit a model for `target` over samples laid out as `feature_names`.
///
/// The returned model has version 0; the trainer assigns the real version.
pub fn fit(
    target: PredictionTarget,
    samples: &[TrainingSample],
    feature_names: &[&str],
    config: &PredictorConfig,
) -> KernelResult<PredictorModel> {
    if samples.len() < config.min_training_samples {
        return Err(KernelError::InsufficientSamples {
            required: config.min_training_samples,
            actual: samples.len(),
        });
    }

    let rows: Vec<&[f64]> = samples.iter().map(|s| s.features.as_slice()).collect();
    let x = design_matrix(&rows, feature_names.len())?;
    let y: Array1<f64> = samples.iter().map(|s| target.label(s, config)).collect();

    let LinearFit {
        coefficients,
        intercept,
    } = match target.model_type() {
        ModelType::Ridge => fit_ridge(&x, &y, config.ridge_alpha)?,
        ModelType::Logistic => fit_logistic(
            &x,
            &y,
            GradientDescent {
                learning_rate: config.learning_rate,
                max_iterations: config.max_iterations,
                tolerance: config.gradient_tolerance,
            },
        ),
    };

    let model = PredictorModel {
        target: target.as_str().to_string(),
        model_type: target.model_type(),
        feature_names: feature_names.iter().map(|n| n.to_string()).collect(),
        coefficients,
        intercept,
        feature_version: FEATURE_VERSION,
        trained_at: Utc::now(),
        training_samples: samples.len(),
        version: 0,
    };
    model.validate()?;
    Ok(model)
}

pub struct ModelTrainer {
    source: Arc<dyn TrainingDataSource>,
    registry: Arc<ModelRegistry>,
    config: PredictorConfig,
}

impl ModelTrainer {
    pub fn new(source: Arc<dyn TrainingDataSource>, registry: Arc<ModelRegistry>, config: PredictorConfig) -> Self {
        Self {
            source,
            registry,
            config,
        }
    }

    /// Train `target` on the lookback window and install the result.
    ///
    /// Any failure leaves the previously installed model in force.
    pub fn train(&self, target: PredictionTarget) -> KernelResult<Arc<PredictorModel>> {
        let since = Utc::now() - Duration::days(self.config.lookback_days);
        let samples = self.source.samples_since(since)?;

        let mut model = match fit(target, &samples, FEATURE_NAMES, &self.config) {
            Ok(model) => model,
            Err(e) => {
                warn!(target = target.as_str(), samples = samples.len(), error = %e, "training skipped");
                return Err(e);
            }
        };
        model.version = self.registry.next_version(target);

        info!(
            target = target.as_str(),
            model_type = %model.model_type,
            samples = samples.len(),
            version = model.version,
            "model trained"
        );
        self.registry.install(target, model)
    }

    /// Train every target, returning the per-target outcome.
    pub fn train_all(&self) -> Vec<(PredictionTarget, KernelResult<Arc<PredictorModel>>)> {
        PredictionTarget::ALL
            .iter()
            .map(|t| (*t, self.train(*t)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::InMemoryModelRepository;
    use parking_lot::Mutex;
    use pulse_features::FEATURE_COUNT;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Synthetic history: engagement rises with feature 0, growth with feature 1.
    pub(crate) fn synthetic_samples(n: usize, seed: u64) -> Vec<TrainingSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let features: Vec<f64> = (0..FEATURE_COUNT).map(|_| rng.gen_range(0.0..1.0)).collect();
                TrainingSample {
                    engagement_rate: 0.01 + 0.05 * features[0],
                    followers_gained: if features[1] > 0.5 { 6.0 } else { 0.0 },
                    features,
                    posted_at: Utc::now(),
                }
            })
            .collect()
    }

    pub(crate) struct FixedSource(pub Mutex<Vec<TrainingSample>>);

    impl TrainingDataSource for FixedSource {
        fn samples_since(&self, since: chrono::DateTime<Utc>) -> KernelResult<Vec<TrainingSample>> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|s| s.posted_at >= since)
                .cloned()
                .collect())
        }
    }

    fn trainer(samples: Vec<TrainingSample>) -> (ModelTrainer, Arc<FixedSource>, Arc<ModelRegistry>) {
        let source = Arc::new(FixedSource(Mutex::new(samples)));
        let registry = Arc::new(ModelRegistry::new(
            Arc::new(InMemoryModelRepository::new()),
            std::time::Duration::from_secs(3600),
        ));
        let trainer = ModelTrainer::new(source.clone(), registry.clone(), PredictorConfig::default());
        (trainer, source, registry)
    }

    #[test]
    fn test_too_few_samples() {
        let config = PredictorConfig::default();
        let err = fit(
            PredictionTarget::EngagementRate,
            &synthetic_samples(19, 1),
            FEATURE_NAMES,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            KernelError::InsufficientSamples { required: 20, actual: 19 }
        ));
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_ragged_sample_rejected() {
        let mut samples = synthetic_samples(30, 2);
        samples[7].features.pop();
        let err = fit(
            PredictionTarget::FollowerGrowth,
            &samples,
            FEATURE_NAMES,
            &PredictorConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_follower_growth_labels_use_threshold() {
        let config = PredictorConfig::default();
        let mut sample = synthetic_samples(1, 3).remove(0);
        sample.followers_gained = 3.0;
        assert_eq!(PredictionTarget::FollowerGrowth.label(&sample, &config), 1.0);
        sample.followers_gained = 2.9;
        assert_eq!(PredictionTarget::FollowerGrowth.label(&sample, &config), 0.0);
    }

    #[test]
    fn test_train_versions_increment() {
        let (trainer, _, registry) = trainer(synthetic_samples(200, 4));
        let first = trainer.train(PredictionTarget::EngagementRate).unwrap();
        let second = trainer.train(PredictionTarget::EngagementRate).unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(first.coefficients.len(), FEATURE_COUNT);
        assert_eq!(first.feature_version, FEATURE_VERSION);
        assert_eq!(registry.current(PredictionTarget::EngagementRate).unwrap().version, 2);
        // Engagement was generated from feature 0 alone.
        assert!((first.coefficients[0] - 0.05).abs() < 0.01);
    }

    #[test]
    fn test_failed_training_keeps_previous_model() {
        let (trainer, source, registry) = trainer(synthetic_samples(100, 5));
        trainer.train(PredictionTarget::FollowerGrowth).unwrap();

        source.0.lock().truncate(5);
        let err = trainer.train(PredictionTarget::FollowerGrowth).unwrap_err();
        assert!(err.is_not_ready());

        let current = registry.current(PredictionTarget::FollowerGrowth).unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.training_samples, 100);
    }

    #[test]
    fn test_lookback_window_excludes_old_samples() {
        let mut samples = synthetic_samples(40, 6);
        for s in samples.iter_mut().take(25) {
            s.posted_at = Utc::now() - Duration::days(45);
        }
        let (trainer, _, _) = trainer(samples);
        let err = trainer.train(PredictionTarget::EngagementRate).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InsufficientSamples { actual: 15, .. }
        ));
    }

    #[test]
    fn test_train_all() {
        let (trainer, _, registry) = trainer(synthetic_samples(120, 7));
        let results = trainer.train_all();
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        let growth = registry.current(PredictionTarget::FollowerGrowth).unwrap();
        assert_eq!(growth.model_type, ModelType::Logistic);
        assert!(growth.coefficients[1] > 0.0);
    }
}

//! Prediction from installed models with conservative defaults.

use pulse_core::config::PredictorConfig;
use pulse_core::{KernelError, KernelResult, Prediction};
use pulse_features::{ContentFeatures, FEATURE_COUNT, FEATURE_VERSION};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::logistic::sigmoid;
use crate::model::{ModelType, PredictorModel};
use crate::registry::ModelRegistry;
use crate::trainer::PredictionTarget;

/// Score one feature vector: sigmoid for logistic, clamped to [0, 1] for ridge.
pub fn predict(model: &PredictorModel, features: &[f64]) -> KernelResult<f64> {
    let score = model.linear_score(features)?;
    let value = match model.model_type {
        ModelType::Logistic => sigmoid(score),
        ModelType::Ridge => score.clamp(0.0, 1.0),
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

/// `min(1, n / (2 * min_samples))`; an uncalibrated proxy, not a probability.
pub fn confidence(model: &PredictorModel, min_samples: usize) -> f64 {
    let denom = (2 * min_samples.max(1)) as f64;
    (model.training_samples as f64 / denom).min(1.0)
}

/// The `k` features with the largest absolute coefficients, largest first.
pub fn top_features(model: &PredictorModel, k: usize) -> Vec<(String, f64)> {
    let mut weights: Vec<(String, f64)> = model
        .feature_names
        .iter()
        .cloned()
        .zip(model.coefficients.iter().copied())
        .collect();
    weights.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    weights.truncate(k);
    weights
}

pub struct Predictor {
    registry: Arc<ModelRegistry>,
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(registry: Arc<ModelRegistry>, config: PredictorConfig) -> Self {
        Self { registry, config }
    }

    fn default_value(&self, target: PredictionTarget) -> f64 {
        match target {
            PredictionTarget::EngagementRate => self.config.default_engagement_rate,
            PredictionTarget::FollowerGrowth => self.config.default_follower_growth,
        }
    }

    /// Installed model usable with the current feature layout.
    fn usable_model(&self, target: PredictionTarget) -> Option<Arc<PredictorModel>> {
        let model = self.registry.current(target)?;
        if model.feature_version != FEATURE_VERSION {
            warn!(
                target = target.as_str(),
                model_features = model.feature_version,
                current_features = FEATURE_VERSION,
                "model trained on another feature layout, using defaults"
            );
            return None;
        }
        Some(model)
    }

    /// Predict `target` for a raw feature vector.
    ///
    /// The vector must follow the current feature layout, model or not.
    /// Without a usable model this returns the configured default with
    /// confidence 0.
    pub fn predict(&self, target: PredictionTarget, features: &[f64]) -> KernelResult<Prediction> {
        if features.len() != FEATURE_COUNT {
            return Err(KernelError::FeatureLengthMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }
        let Some(model) = self.usable_model(target) else {
            return Ok(Prediction {
                value: self.default_value(target),
                confidence: 0.0,
            });
        };
        let value = predict(&model, features)?;
        debug!(target = target.as_str(), value, version = model.version, "prediction");
        Ok(Prediction {
            value,
            confidence: confidence(&model, self.config.min_training_samples),
        })
    }

    pub fn predict_features(&self, target: PredictionTarget, features: &ContentFeatures) -> KernelResult<Prediction> {
        self.predict(target, &features.to_array())
    }

    /// Indices of `candidates` ordered by predicted value, highest first.
    /// Equal predictions keep their input order.
    pub fn rank(&self, target: PredictionTarget, candidates: &[Vec<f64>]) -> KernelResult<Vec<(usize, Prediction)>> {
        let mut scored = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| self.predict(target, c).map(|p| (i, p)))
            .collect::<KernelResult<Vec<_>>>()?;
        scored.sort_by(|a, b| {
            b.1.value
                .partial_cmp(&a.1.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(scored)
    }
}

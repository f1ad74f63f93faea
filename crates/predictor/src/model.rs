//! Trained model record: coefficients aligned with named features.

use chrono::{DateTime, Utc};
use pulse_core::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Ridge,
    Logistic,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Ridge => write!(f, "ridge"),
            ModelType::Logistic => write!(f, "logistic"),
        }
    }
}

/// A linear model over a fixed feature layout. Replaced wholesale, never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorModel {
    /// Name of the predicted quantity.
    pub target: String,
    pub model_type: ModelType,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub feature_version: u32,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub version: u32,
}

impl PredictorModel {
    /// Check the coefficient/name alignment and that every weight is finite.
    pub fn validate(&self) -> KernelResult<()> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(KernelError::FeatureLengthMismatch {
                expected: self.feature_names.len(),
                actual: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(KernelError::Persistence(format!(
                "model {}@v{} has non-finite weights",
                self.target, self.version
            )));
        }
        Ok(())
    }

    /// Raw linear score `w . x + b`.
    pub fn linear_score(&self, features: &[f64]) -> KernelResult<f64> {
        if features.len() != self.coefficients.len() {
            return Err(KernelError::FeatureLengthMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| if x.is_finite() { w * x } else { 0.0 })
            .sum();
        Ok(dot + self.intercept)
    }

    pub fn to_json(&self) -> KernelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(blob: &str) -> KernelResult<Self> {
        let model: Self = serde_json::from_str(blob)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
pub(crate) fn test_model(model_type: ModelType, coefficients: Vec<f64>, intercept: f64) -> PredictorModel {
    PredictorModel {
        target: "test".into(),
        model_type,
        feature_names: (0..coefficients.len()).map(|i| format!("f{i}")).collect(),
        coefficients,
        intercept,
        feature_version: pulse_features::FEATURE_VERSION,
        trained_at: Utc::now(),
        training_samples: 40,
        version: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_misaligned_coefficients() {
        let mut model = test_model(ModelType::Ridge, vec![1.0, 2.0], 0.0);
        assert!(model.validate().is_ok());
        model.feature_names.pop();
        assert!(matches!(
            model.validate(),
            Err(KernelError::FeatureLengthMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_validate_rejects_nan_weights() {
        let model = test_model(ModelType::Logistic, vec![f64::NAN], 0.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_linear_score() {
        let model = test_model(ModelType::Ridge, vec![2.0, -1.0], 0.5);
        assert!((model.linear_score(&[1.0, 3.0]).unwrap() - (-0.5)).abs() < 1e-12);
        assert!(model.linear_score(&[1.0]).is_err());
    }

    #[test]
    fn test_json_blob() {
        let model = test_model(ModelType::Logistic, vec![0.25, 4.0], -1.0);
        let blob = model.to_json().unwrap();
        assert!(blob.contains("\"model_type\":\"logistic\""));
        assert_eq!(PredictorModel::from_json(&blob).unwrap(), model);
        assert!(PredictorModel::from_json("{not json").is_err());
    }
}

use thiserror::Error;

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Candidate list is empty")]
    EmptyCandidates,

    #[error("Feature vector length mismatch: expected {expected}, got {actual}")]
    FeatureLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid reward for arm {arm_id}: {reward}")]
    InvalidReward { arm_id: String, reward: f64 },

    #[error("Insufficient samples: need at least {required}, have {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Singular matrix: pivot {pivot:e} at column {column}")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KernelError {
    /// Insufficient-data conditions are a "not ready" signal rather than a
    /// failure; callers fall back to defaults or priors.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, KernelError::InsufficientSamples { .. })
    }

    /// Caller-contract violations are never guessed around.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            KernelError::EmptyCandidates
                | KernelError::FeatureLengthMismatch { .. }
                | KernelError::InvalidReward { .. }
        )
    }
}

impl From<config::ConfigError> for KernelError {
    fn from(err: config::ConfigError) -> Self {
        KernelError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(KernelError::EmptyCandidates.is_contract_violation());
        assert!(KernelError::FeatureLengthMismatch {
            expected: 3,
            actual: 2
        }
        .is_contract_violation());
        assert!(KernelError::InsufficientSamples {
            required: 20,
            actual: 4
        }
        .is_not_ready());
        assert!(!KernelError::Persistence("down".into()).is_not_ready());
        assert!(!KernelError::SingularMatrix {
            column: 1,
            pivot: 0.0
        }
        .is_contract_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = KernelError::InsufficientSamples {
            required: 20,
            actual: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient samples: need at least 20, have 5"
        );
    }
}

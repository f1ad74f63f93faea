//! Regression predictor: ridge regression for engagement rate, logistic
//! regression for follower growth, trained in batch and served from a
//! versioned model registry.

pub mod linalg;
pub mod logistic;
pub mod model;
pub mod predict;
pub mod registry;
pub mod ridge;
pub mod trainer;

pub use model::{ModelType, PredictorModel};
pub use predict::{confidence, predict, top_features, Predictor};
pub use registry::{InMemoryModelRepository, ModelRegistry, ModelRepository};
pub use trainer::{fit, ModelTrainer, PredictionTarget, TrainingDataSource};

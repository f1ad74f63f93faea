pub mod config;
pub mod error;
pub mod types;

pub use config::KernelConfig;
pub use error::{KernelError, KernelResult};
pub use types::{
    ArmSelection, ContentMetadata, EngagementCounters, Prediction, Scope, SelectionAlgorithm,
    TrainingSample,
};

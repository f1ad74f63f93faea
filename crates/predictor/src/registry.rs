//! Model persistence and the in-process "current model" slot per target.

use dashmap::DashMap;
use parking_lot::RwLock;
use pulse_cache::TtlCache;
use pulse_core::KernelResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::model::PredictorModel;
use crate::trainer::PredictionTarget;

/// Stores serialized model blobs keyed by target and version.
pub trait ModelRepository: Send + Sync {
    fn save(&self, target: &str, version: u32, blob: &str) -> KernelResult<()>;

    /// Blob of the highest version stored for `target`.
    fn load_latest(&self, target: &str) -> KernelResult<Option<String>>;
}

/// In-memory repository keyed by `(target, version)`.
#[derive(Default)]
pub struct InMemoryModelRepository {
    blobs: DashMap<(String, u32), String>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions(&self, target: &str) -> Vec<u32> {
        let mut versions: Vec<u32> = self
            .blobs
            .iter()
            .filter(|e| e.key().0 == target)
            .map(|e| e.key().1)
            .collect();
        versions.sort_unstable();
        versions
    }
}

impl ModelRepository for InMemoryModelRepository {
    fn save(&self, target: &str, version: u32, blob: &str) -> KernelResult<()> {
        self.blobs
            .insert((target.to_string(), version), blob.to_string());
        Ok(())
    }

    fn load_latest(&self, target: &str) -> KernelResult<Option<String>> {
        let latest = self
            .blobs
            .iter()
            .filter(|e| e.key().0 == target)
            .max_by_key(|e| e.key().1)
            .map(|e| e.value().clone());
        Ok(latest)
    }
}

/// Current model per target.
///
/// Models installed by this process live in `installed` and are swapped as a
/// whole `Arc`; readers holding the old `Arc` keep a consistent model. Models
/// written by other processes are picked up from the repository once the
/// cached entry expires.
pub struct ModelRegistry {
    repository: Arc<dyn ModelRepository>,
    installed: RwLock<HashMap<PredictionTarget, Arc<PredictorModel>>>,
    cache: TtlCache<PredictionTarget, Arc<PredictorModel>>,
    ttl: Duration,
}

impl ModelRegistry {
    pub fn new(repository: Arc<dyn ModelRepository>, cache_ttl: Duration) -> Self {
        info!(ttl_secs = cache_ttl.as_secs(), "Model registry initialized");
        Self {
            repository,
            installed: RwLock::new(HashMap::new()),
            cache: TtlCache::new(PredictionTarget::ALL.len() * 4),
            ttl: cache_ttl,
        }
    }

    /// Persist and install `model` as the current one for `target`.
    ///
    /// On any failure the previous model stays current.
    pub fn install(&self, target: PredictionTarget, model: PredictorModel) -> KernelResult<Arc<PredictorModel>> {
        model.validate()?;
        let blob = model.to_json()?;
        self.repository.save(target.as_str(), model.version, &blob)?;

        let model = Arc::new(model);
        self.installed.write().insert(target, Arc::clone(&model));
        self.cache.put(target, Arc::clone(&model), self.ttl);

        info!(
            target = target.as_str(),
            version = model.version,
            samples = model.training_samples,
            "model installed"
        );
        Ok(model)
    }

    /// The current model, or `None` when none was ever trained.
    pub fn current(&self, target: PredictionTarget) -> Option<Arc<PredictorModel>> {
        if let Some(model) = self.cache.get(&target) {
            return Some(model);
        }

        let local = self.installed.read().get(&target).cloned();
        let stored = match self.load_stored(target) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(target = target.as_str(), error = %e, "model repository unavailable");
                return local;
            }
        };

        let newest = match (local, stored) {
            (Some(l), Some(s)) if s.version > l.version => Some(Arc::new(s)),
            (Some(l), _) => Some(l),
            (None, Some(s)) => Some(Arc::new(s)),
            (None, None) => None,
        };
        if let Some(model) = &newest {
            self.cache.put(target, Arc::clone(model), self.ttl);
        }
        newest
    }

    fn load_stored(&self, target: PredictionTarget) -> KernelResult<Option<PredictorModel>> {
        match self.repository.load_latest(target.as_str())? {
            Some(blob) => Ok(Some(PredictorModel::from_json(&blob)?)),
            None => Ok(None),
        }
    }

    /// Version the next trained model for `target` should carry.
    pub fn next_version(&self, target: PredictionTarget) -> u32 {
        self.current(target).map_or(1, |m| m.version + 1)
    }
}

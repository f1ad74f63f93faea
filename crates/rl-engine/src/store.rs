//! Arm Store: persistence seam for per-arm sufficient statistics.
//!
//! Each arm is independent, so no cross-arm transaction is needed. Concurrent
//! updates to the same arm are last-write-wins.

use dashmap::DashMap;
use pulse_core::{KernelResult, Scope};
use tracing::info;

use crate::arm::BanditArm;

pub trait ArmStore: Send + Sync {
    /// Every arm in `scope`.
    fn load(&self, scope: Scope) -> KernelResult<Vec<BanditArm>>;

    fn get(&self, scope: Scope, arm_id: &str) -> KernelResult<Option<BanditArm>> {
        Ok(self.load(scope)?.into_iter().find(|a| a.arm_id == arm_id))
    }

    /// Insert or replace the row keyed by `(scope, arm_id)`.
    fn upsert(&self, arm: &BanditArm) -> KernelResult<()>;
}

/// In-memory arm store backed by DashMap.
pub struct InMemoryArmStore {
    arms: DashMap<(Scope, String), BanditArm>,
}

impl InMemoryArmStore {
    pub fn new() -> Self {
        info!("Arm store initialized (in-memory)");
        Self {
            arms: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

impl Default for InMemoryArmStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmStore for InMemoryArmStore {
    fn load(&self, scope: Scope) -> KernelResult<Vec<BanditArm>> {
        let mut arms: Vec<BanditArm> = self
            .arms
            .iter()
            .filter(|entry| entry.key().0 == scope)
            .map(|entry| entry.value().clone())
            .collect();
        arms.sort_by(|a, b| a.arm_id.cmp(&b.arm_id));
        Ok(arms)
    }

    fn get(&self, scope: Scope, arm_id: &str) -> KernelResult<Option<BanditArm>> {
        Ok(self
            .arms
            .get(&(scope, arm_id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    fn upsert(&self, arm: &BanditArm) -> KernelResult<()> {
        self.arms
            .insert((arm.scope, arm.arm_id.clone()), arm.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::config::BetaPrior;

    #[test]
    fn test_upsert_is_idempotent() {
        let store = InMemoryArmStore::new();
        let arm = BanditArm::new("a|b|c", Scope::Content, BetaPrior::default(), Utc::now());
        store.upsert(&arm).unwrap();
        store.upsert(&arm).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Scope::Content, "a|b|c").unwrap(), Some(arm));
    }

    #[test]
    fn test_scopes_are_isolated() {
        let store = InMemoryArmStore::new();
        let now = Utc::now();
        store
            .upsert(&BanditArm::new("same", Scope::Content, BetaPrior::default(), now))
            .unwrap();
        store
            .upsert(&BanditArm::new("same", Scope::Reply, BetaPrior::default(), now))
            .unwrap();
        store
            .upsert(&BanditArm::new("9-1", Scope::Timing, BetaPrior::default(), now))
            .unwrap();
        assert_eq!(store.load(Scope::Content).unwrap().len(), 1);
        assert_eq!(store.load(Scope::Reply).unwrap().len(), 1);
        assert!(store.get(Scope::Timing, "same").unwrap().is_none());
    }

    #[test]
    fn test_load_is_sorted_by_id() {
        let store = InMemoryArmStore::new();
        let now = Utc::now();
        for id in ["c", "a", "b"] {
            store
                .upsert(&BanditArm::new(id, Scope::Content, BetaPrior::default(), now))
                .unwrap();
        }
        let ids: Vec<String> = store
            .load(Scope::Content)
            .unwrap()
            .into_iter()
            .map(|a| a.arm_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_default_get_goes_through_load() {
        struct LoadOnly(InMemoryArmStore);

        impl ArmStore for LoadOnly {
            fn load(&self, scope: Scope) -> KernelResult<Vec<BanditArm>> {
                self.0.load(scope)
            }
            fn upsert(&self, arm: &BanditArm) -> KernelResult<()> {
                self.0.upsert(arm)
            }
        }

        let store = LoadOnly(InMemoryArmStore::new());
        let arm = BanditArm::new("x|y", Scope::Reply, BetaPrior::default(), Utc::now());
        store.upsert(&arm).unwrap();
        assert_eq!(store.get(Scope::Reply, "x|y").unwrap(), Some(arm));
        assert_eq!(store.get(Scope::Reply, "nope").unwrap(), None);
    }
}

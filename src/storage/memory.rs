use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AlarmStorage, build_alarm};
use crate::alarm::{Alarm, AlarmId, NewAlarm};

/// Volatile backend for tests and simulation mode.
pub struct InMemoryStorage {
    store: RwLock<(AlarmId, HashMap<AlarmId, Alarm>)>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            store: RwLock::new((1, HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlarmStorage for InMemoryStorage {
    async fn insert(&self, spec: NewAlarm) -> anyhow::Result<Alarm> {
        let mut store = self.store.write().await;
        let id = store.0;
        let alarm = build_alarm(id, spec);
        store.1.insert(id, alarm.clone());
        store.0 += 1;
        log::debug!("stored alarm {id}");
        Ok(alarm)
    }

    async fn update(&self, alarm: Alarm) -> anyhow::Result<bool> {
        let mut store = self.store.write().await;
        if !store.1.contains_key(&alarm.id) {
            return Ok(false);
        }
        store.1.insert(alarm.id, alarm);
        Ok(true)
    }

    async fn get(&self, id: AlarmId) -> anyhow::Result<Option<Alarm>> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Alarm>> {
        let store = self.store.read().await;
        Ok(store.1.values().cloned().collect())
    }

    async fn delete(&self, id: AlarmId) -> anyhow::Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.1.remove(&id).is_some())
    }
}

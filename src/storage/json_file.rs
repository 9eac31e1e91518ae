use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{AlarmStorage, build_alarm};
use crate::alarm::{Alarm, AlarmId, NewAlarm};

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    alarms: Vec<Alarm>,
    next_id: AlarmId,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            alarms: Vec::new(),
            next_id: 1,
        }
    }
}

/// Single-document JSON persistence: the whole alarm set plus the id counter
/// live in one file that is rewritten after every mutation. Alarm counts are
/// capped at a handful, so a full rewrite per write is fine.
pub struct JsonFileStorage {
    path: PathBuf,
    state: RwLock<Document>,
}

impl JsonFileStorage {
    /// Opens (or initializes) the alarm file. An unreadable or malformed
    /// file is logged and replaced with an empty set rather than refusing to
    /// start the clock.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Document>(&bytes) {
                Ok(doc) => doc,
                Err(err) => {
                    log::error!("malformed alarm file {}: {err}", path.display());
                    Document::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(err) => return Err(err.into()),
        };
        log::info!(
            "loaded {} alarm(s) from {}",
            doc.alarms.len(),
            path.display()
        );
        Ok(JsonFileStorage {
            path,
            state: RwLock::new(doc),
        })
    }

    async fn persist(&self, doc: &Document) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl AlarmStorage for JsonFileStorage {
    async fn insert(&self, spec: NewAlarm) -> anyhow::Result<Alarm> {
        let mut doc = self.state.write().await;
        let alarm = build_alarm(doc.next_id, spec);
        doc.alarms.push(alarm.clone());
        doc.next_id += 1;
        self.persist(&doc).await?;
        Ok(alarm)
    }

    async fn update(&self, alarm: Alarm) -> anyhow::Result<bool> {
        let mut doc = self.state.write().await;
        let Some(slot) = doc.alarms.iter_mut().find(|a| a.id == alarm.id) else {
            return Ok(false);
        };
        *slot = alarm;
        self.persist(&doc).await?;
        Ok(true)
    }

    async fn get(&self, id: AlarmId) -> anyhow::Result<Option<Alarm>> {
        let doc = self.state.read().await;
        Ok(doc.alarms.iter().find(|a| a.id == id).cloned())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Alarm>> {
        let doc = self.state.read().await;
        Ok(doc.alarms.clone())
    }

    async fn delete(&self, id: AlarmId) -> anyhow::Result<bool> {
        let mut doc = self.state.write().await;
        let before = doc.alarms.len();
        doc.alarms.retain(|a| a.id != id);
        if doc.alarms.len() == before {
            return Ok(false);
        }
        self.persist(&doc).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::FireTime;

    fn spec(minute: u32) -> NewAlarm {
        NewAlarm::at(7, FireTime::from_hm(6, minute).unwrap())
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");

        let storage = JsonFileStorage::open(&path).await.unwrap();
        let a = storage.insert(spec(15)).await.unwrap();
        let b = storage.insert(spec(30)).await.unwrap();
        storage.delete(a.id).await.unwrap();
        drop(storage);

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        let all = reopened.get_all().await.unwrap();
        assert_eq!(all, vec![b]);
        // The id counter persists too; deleted ids are never reused.
        let c = reopened.insert(spec(45)).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let storage = JsonFileStorage::open(&path).await.unwrap();
        assert!(storage.get_all().await.unwrap().is_empty());
        let a = storage.insert(spec(0)).await.unwrap();
        assert_eq!(a.id, 1);
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(storage.get_all().await.unwrap().is_empty());
    }
}

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::InMemoryStorage;

use async_trait::async_trait;

use crate::alarm::{Alarm, AlarmId, NewAlarm};

/// Durable CRUD over alarm records. Backends assign ids monotonically and
/// persist every mutation before returning; the registry layers capacity,
/// validation and write ordering on top.
#[async_trait]
pub trait AlarmStorage: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn insert(&self, spec: NewAlarm) -> anyhow::Result<Alarm>;

    /// Replaces the stored record with the same id. Whether the id existed
    /// is reported so callers can map absence to their own error kind.
    async fn update(&self, alarm: Alarm) -> anyhow::Result<bool>;

    async fn get(&self, id: AlarmId) -> anyhow::Result<Option<Alarm>>;

    async fn get_all(&self) -> anyhow::Result<Vec<Alarm>>;

    async fn delete(&self, id: AlarmId) -> anyhow::Result<bool>;
}

pub(crate) fn build_alarm(id: AlarmId, spec: NewAlarm) -> Alarm {
    Alarm {
        id,
        owner_id: spec.owner_id,
        time: spec.time,
        weekdays: spec.weekdays,
        enabled: spec.enabled,
        label: spec.label,
        sound_ref: spec.sound_ref,
        snooze_allowed: spec.snooze_allowed,
        snooze_duration_minutes: spec.snooze_duration_minutes.unwrap_or(5),
        snooze_until: None,
        last_triggered: None,
    }
}

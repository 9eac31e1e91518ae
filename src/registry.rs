use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tokio::sync::Mutex;

use crate::alarm::{Alarm, AlarmId, NewAlarm, OwnerId, UpdateAlarm};
use crate::error::{Error, Result};
use crate::storage::AlarmStorage;
use crate::trigger::now_local;

/// Coordinating layer over the storage backend: enforces the alarm-count
/// cap, validates inputs, and owns the snooze/dismiss mutations. A single
/// mutation lock serializes all writers, so concurrent updates to one alarm
/// never interleave partially; at the clock's scale (ten alarms, 1 Hz polls)
/// a coarse lock is plenty.
pub struct AlarmRegistry {
    storage: Arc<dyn AlarmStorage>,
    max_alarms: usize,
    default_snooze_minutes: u32,
    mutation: Mutex<()>,
}

impl AlarmRegistry {
    pub fn new(storage: Arc<dyn AlarmStorage>, max_alarms: usize, default_snooze_minutes: u32) -> Self {
        AlarmRegistry {
            storage,
            max_alarms,
            default_snooze_minutes,
            mutation: Mutex::new(()),
        }
    }

    pub async fn add(&self, mut spec: NewAlarm) -> Result<Alarm> {
        validate_weekdays(&spec.weekdays)?;
        if let Some(minutes) = spec.snooze_duration_minutes {
            validate_snooze_minutes(minutes)?;
        } else {
            spec.snooze_duration_minutes = Some(self.default_snooze_minutes);
        }

        let _guard = self.mutation.lock().await;
        let count = self.storage.get_all().await.map_err(Error::Storage)?.len();
        if count >= self.max_alarms {
            return Err(Error::CapacityExceeded {
                max: self.max_alarms,
            });
        }
        let alarm = self.storage.insert(spec).await.map_err(Error::Storage)?;
        log::info!("added alarm {} ({})", alarm.id, alarm.label);
        Ok(alarm)
    }

    pub async fn get(&self, id: AlarmId) -> Result<Alarm> {
        self.storage
            .get(id)
            .await
            .map_err(Error::Storage)?
            .ok_or(Error::NotFound(id))
    }

    /// Snapshot of every alarm, ordered by id. Copies only; registry state
    /// can only change through the mutators.
    pub async fn list_all(&self) -> Result<Vec<Alarm>> {
        let mut alarms = self.storage.get_all().await.map_err(Error::Storage)?;
        alarms.sort_by_key(|a| a.id);
        Ok(alarms)
    }

    pub async fn list_for_owner(&self, owner_id: OwnerId) -> Result<Vec<Alarm>> {
        let mut alarms = self.list_all().await?;
        alarms.retain(|a| a.owner_id == owner_id);
        Ok(alarms)
    }

    /// Patch update: only fields present in `patch` are touched.
    pub async fn update(&self, id: AlarmId, patch: UpdateAlarm) -> Result<Alarm> {
        if let Some(weekdays) = &patch.weekdays {
            validate_weekdays(weekdays)?;
        }
        if let Some(minutes) = patch.snooze_duration_minutes {
            validate_snooze_minutes(minutes)?;
        }

        let _guard = self.mutation.lock().await;
        let mut alarm = self.get(id).await?;
        if let Some(time) = patch.time {
            alarm.time = time;
        }
        if let Some(weekdays) = patch.weekdays {
            alarm.weekdays = weekdays;
        }
        if let Some(enabled) = patch.enabled {
            alarm.enabled = enabled;
        }
        if let Some(label) = patch.label {
            alarm.label = label;
        }
        if let Some(sound_ref) = patch.sound_ref {
            alarm.sound_ref = sound_ref;
        }
        if let Some(snooze_allowed) = patch.snooze_allowed {
            alarm.snooze_allowed = snooze_allowed;
        }
        if let Some(minutes) = patch.snooze_duration_minutes {
            alarm.snooze_duration_minutes = minutes;
        }
        self.write_back(alarm.clone()).await?;
        Ok(alarm)
    }

    pub async fn delete(&self, id: AlarmId) -> Result<bool> {
        let _guard = self.mutation.lock().await;
        let existed = self.storage.delete(id).await.map_err(Error::Storage)?;
        if existed {
            log::info!("deleted alarm {id}");
        }
        Ok(existed)
    }

    /// Starts (or extends) a snooze. `minutes` falls back to the alarm's own
    /// snooze duration. Snoozing an alarm that is not currently ringing is
    /// allowed; suppression simply starts now.
    pub async fn snooze(&self, id: AlarmId, minutes: Option<u32>) -> Result<Alarm> {
        self.snooze_at(id, minutes, now_local()).await
    }

    pub async fn snooze_at(
        &self,
        id: AlarmId,
        minutes: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<Alarm> {
        if let Some(minutes) = minutes {
            validate_snooze_minutes(minutes)?;
        }

        let _guard = self.mutation.lock().await;
        let mut alarm = self.get(id).await?;
        if !alarm.snooze_allowed {
            return Err(Error::invalid(format!("alarm {id} does not allow snoozing")));
        }
        let minutes = minutes.unwrap_or(alarm.snooze_duration_minutes);
        alarm.snooze_until = Some(now + Duration::minutes(i64::from(minutes)));
        self.write_back(alarm.clone()).await?;
        log::info!("snoozed alarm {id} for {minutes} min");
        Ok(alarm)
    }

    /// Acknowledges the alarm for today: records the trigger instant (the
    /// same-day guard the evaluator checks) and drops any pending snooze.
    pub async fn dismiss(&self, id: AlarmId) -> Result<Alarm> {
        self.dismiss_at(id, now_local()).await
    }

    pub async fn dismiss_at(&self, id: AlarmId, now: NaiveDateTime) -> Result<Alarm> {
        let _guard = self.mutation.lock().await;
        let mut alarm = self.get(id).await?;
        alarm.last_triggered = Some(now);
        alarm.snooze_until = None;
        self.write_back(alarm.clone()).await?;
        log::info!("dismissed alarm {id}");
        Ok(alarm)
    }

    async fn write_back(&self, alarm: Alarm) -> Result<()> {
        let id = alarm.id;
        let existed = self.storage.update(alarm).await.map_err(Error::Storage)?;
        if !existed {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }
}

fn validate_weekdays(weekdays: &[u8]) -> Result<()> {
    match weekdays.iter().find(|&&d| d > 6) {
        Some(bad) => Err(Error::invalid(format!(
            "weekday index {bad} out of range (Monday=0 .. Sunday=6)"
        ))),
        None => Ok(()),
    }
}

fn validate_snooze_minutes(minutes: u32) -> Result<()> {
    if minutes == 0 {
        return Err(Error::invalid("snooze duration must be at least 1 minute"));
    }
    Ok(())
}

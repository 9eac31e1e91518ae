use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::active::ActiveSlot;
use crate::alarm::{Alarm, AlarmId, NewAlarm, OwnerId, UpdateAlarm};
use crate::error::{Error, Result};
use crate::registry::AlarmRegistry;
use crate::sink::SoundLibrary;
use crate::trigger::{self, now_local};

/// The clock's public surface: alarm CRUD, snooze/dismiss, the active-alarm
/// accessor, and one reconcile step (`poll_once`) that the background
/// scheduler runs every tick.
///
/// Mutations that can silence the sounder (snooze, dismiss, delete, button
/// press) take the slot lock before touching the registry and clear the slot
/// themselves, so silence latency is bounded by the call itself rather than
/// the poll period — and the poll loop can never re-arm the same alarm in
/// between, because it evaluates under that same lock.
#[derive(Clone)]
pub struct AlarmClock {
    registry: Arc<AlarmRegistry>,
    slot: Arc<ActiveSlot>,
    sounds: SoundLibrary,
}

impl AlarmClock {
    pub fn new(registry: Arc<AlarmRegistry>, slot: Arc<ActiveSlot>, sounds: SoundLibrary) -> Self {
        AlarmClock {
            registry,
            slot,
            sounds,
        }
    }

    pub fn registry(&self) -> &AlarmRegistry {
        &self.registry
    }

    pub async fn add_alarm(&self, spec: NewAlarm) -> Result<Alarm> {
        self.registry.add(spec).await
    }

    pub async fn get_alarm(&self, id: AlarmId) -> Result<Alarm> {
        self.registry.get(id).await
    }

    pub async fn list_alarms(&self, owner: Option<OwnerId>) -> Result<Vec<Alarm>> {
        match owner {
            Some(owner_id) => self.registry.list_for_owner(owner_id).await,
            None => self.registry.list_all().await,
        }
    }

    pub async fn update_alarm(&self, id: AlarmId, patch: UpdateAlarm) -> Result<Alarm> {
        // No eager slot handling: if the ringing alarm gets disabled or
        // retimed, the next tick's re-validation stops it.
        self.registry.update(id, patch).await
    }

    pub async fn delete_alarm(&self, id: AlarmId) -> Result<bool> {
        let mut slot = self.slot.lock().await;
        let existed = self.registry.delete(id).await?;
        slot.stop_if(id).await;
        Ok(existed)
    }

    pub async fn snooze_alarm(&self, id: AlarmId, minutes: Option<u32>) -> Result<Alarm> {
        self.snooze_alarm_at(id, minutes, now_local()).await
    }

    pub async fn snooze_alarm_at(
        &self,
        id: AlarmId,
        minutes: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<Alarm> {
        let mut slot = self.slot.lock().await;
        let alarm = self.registry.snooze_at(id, minutes, now).await?;
        slot.stop_if(id).await;
        Ok(alarm)
    }

    pub async fn dismiss_alarm(&self, id: AlarmId) -> Result<Alarm> {
        self.dismiss_alarm_at(id, now_local()).await
    }

    pub async fn dismiss_alarm_at(&self, id: AlarmId, now: NaiveDateTime) -> Result<Alarm> {
        let mut slot = self.slot.lock().await;
        let alarm = self.registry.dismiss_at(id, now).await?;
        slot.stop_if(id).await;
        Ok(alarm)
    }

    /// The hardware dismiss button: acknowledges whatever is ringing.
    /// Returns the dismissed id, or `None` when the clock was quiet.
    pub async fn press_button(&self) -> Result<Option<AlarmId>> {
        let mut slot = self.slot.lock().await;
        let Some(id) = slot.ringing_id() else {
            return Ok(None);
        };
        self.registry.dismiss_at(id, now_local()).await?;
        slot.stop().await;
        log::info!("alarm {id} dismissed via button");
        Ok(Some(id))
    }

    pub async fn active_alarm(&self) -> Option<Alarm> {
        self.slot.current().await
    }

    /// One reconcile step of the trigger state machine.
    ///
    /// Idle: scan every alarm in id order and ring the first match. Ringing:
    /// re-fetch the alarm and stop when it is gone, disabled, snoozed, or
    /// was dismissed today; otherwise keep ringing. The whole step runs
    /// under the slot lock.
    pub async fn poll_once(&self, now: NaiveDateTime) -> Result<()> {
        let mut slot = self.slot.lock().await;
        match slot.ringing_id() {
            None => {
                for alarm in self.registry.list_all().await? {
                    if trigger::should_trigger(&alarm, now) {
                        let sound = alarm
                            .sound_ref
                            .as_deref()
                            .and_then(|r| self.sounds.resolve(r));
                        slot.start(alarm, sound).await;
                        break;
                    }
                }
            }
            Some(id) => match self.registry.get(id).await {
                Err(Error::NotFound(_)) => slot.stop().await,
                Err(err) => return Err(err),
                Ok(alarm) => {
                    if !alarm.enabled {
                        slot.stop().await;
                    } else if !trigger::should_trigger(&alarm, now) {
                        let snoozed = alarm.snooze_until.is_some_and(|until| now < until);
                        let dismissed_today =
                            alarm.last_triggered.is_some_and(|at| at.date() == now.date());
                        if snoozed || dismissed_today {
                            slot.stop().await;
                        }
                        // Otherwise the window merely elapsed while nobody
                        // acknowledged; keep ringing until someone does.
                    }
                }
            },
        }
        Ok(())
    }

    /// Shutdown path: make sure the sink is quiet before the process exits.
    async fn quiesce(&self) {
        self.slot.lock().await.stop().await;
    }
}

/// Background poll loop. One tick per `period`; a failed tick (storage
/// hiccup) is logged and followed by the longer `backoff` sleep instead of
/// crashing the loop.
pub struct TriggerScheduler;

impl TriggerScheduler {
    pub fn spawn(clock: AlarmClock, period: Duration, backoff: Duration) -> SchedulerHandle {
        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();
        let task_handle = tokio::spawn(Self::run(clock, period, backoff, task_token));
        SchedulerHandle {
            task_handle,
            cancellation_token,
        }
    }

    async fn run(
        clock: AlarmClock,
        period: Duration,
        backoff: Duration,
        cancellation_token: CancellationToken,
    ) {
        log::info!("trigger scheduler running ({period:?} tick)");
        loop {
            let sleep_for = match clock.poll_once(now_local()).await {
                Ok(()) => period,
                Err(err) => {
                    log::error!("poll tick failed, backing off: {err}");
                    backoff
                }
            };

            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = time::sleep(sleep_for) => {}
            }
        }
        clock.quiesce().await;
        log::info!("trigger scheduler stopped");
    }
}

/// Handle to the running loop: cancel it and wait (bounded) for the task to
/// wind down, sink already silenced.
pub struct SchedulerHandle {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl SchedulerHandle {
    pub async fn cancel(self, timeout: Duration) {
        self.cancellation_token.cancel();
        let _ = time::timeout(timeout, self.task_handle).await;
    }
}

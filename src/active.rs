use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::alarm::{Alarm, AlarmId};
use crate::sink::OutputSink;

/// The process-wide "currently ringing" state: at most one alarm, guarded by
/// one lock, commanding one sink. Both the poll loop and the snooze/dismiss
/// handlers go through `lock()` and perform their reads and transitions
/// while holding the guard, which is what keeps a dismiss from racing the
/// next tick re-arming the same alarm.
pub struct ActiveSlot {
    sink: Arc<dyn OutputSink>,
    state: Mutex<Option<Alarm>>,
}

impl ActiveSlot {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        ActiveSlot {
            sink,
            state: Mutex::new(None),
        }
    }

    /// Snapshot of the ringing alarm, if any.
    pub async fn current(&self) -> Option<Alarm> {
        self.state.lock().await.clone()
    }

    pub async fn lock(&self) -> SlotGuard<'_> {
        SlotGuard {
            sink: self.sink.as_ref(),
            state: self.state.lock().await,
        }
    }
}

/// Exclusive access to the slot. Transitions are idempotent: starting the
/// alarm that is already ringing, or stopping while idle, does not touch the
/// sink.
pub struct SlotGuard<'a> {
    sink: &'a dyn OutputSink,
    state: MutexGuard<'a, Option<Alarm>>,
}

impl SlotGuard<'_> {
    pub fn ringing(&self) -> Option<&Alarm> {
        self.state.as_ref()
    }

    pub fn ringing_id(&self) -> Option<AlarmId> {
        self.state.as_ref().map(|a| a.id)
    }

    pub async fn start(&mut self, alarm: Alarm, sound: Option<PathBuf>) {
        if self.ringing_id() == Some(alarm.id) {
            return;
        }
        log::info!(
            "alarm {} triggered ({})",
            alarm.id,
            if alarm.label.is_empty() { "unlabeled" } else { &alarm.label }
        );
        self.sink.start(alarm.id, sound).await;
        *self.state = Some(alarm);
    }

    pub async fn stop(&mut self) {
        if self.state.take().is_some() {
            self.sink.stop().await;
        }
    }

    /// Stop only if `id` is the one ringing; used by mutation handlers that
    /// must not wait for the next poll tick.
    pub async fn stop_if(&mut self, id: AlarmId) {
        if self.ringing_id() == Some(id) {
            self.stop().await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::alarm::{FireTime, NewAlarm};
    use async_trait::async_trait;

    /// Records every sink command; shared by the scheduler tests.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub events: std::sync::Mutex<Vec<SinkEvent>>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum SinkEvent {
        Start(AlarmId, Option<PathBuf>),
        Stop,
    }

    #[async_trait]
    impl OutputSink for RecordingSink {
        async fn start(&self, alarm_id: AlarmId, sound: Option<PathBuf>) {
            self.events
                .lock()
                .unwrap()
                .push(SinkEvent::Start(alarm_id, sound));
        }

        async fn stop(&self) {
            self.events.lock().unwrap().push(SinkEvent::Stop);
        }
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<SinkEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    pub(crate) fn dummy_alarm(id: AlarmId) -> Alarm {
        let spec = NewAlarm::at(1, FireTime::from_hm(7, 0).unwrap());
        Alarm {
            id,
            owner_id: spec.owner_id,
            time: spec.time,
            weekdays: spec.weekdays,
            enabled: spec.enabled,
            label: spec.label,
            sound_ref: spec.sound_ref,
            snooze_allowed: spec.snooze_allowed,
            snooze_duration_minutes: 5,
            snooze_until: None,
            last_triggered: None,
        }
    }

    #[tokio::test]
    async fn start_is_idempotent_per_alarm() {
        let sink = Arc::new(RecordingSink::default());
        let slot = ActiveSlot::new(sink.clone());

        let mut guard = slot.lock().await;
        guard.start(dummy_alarm(1), None).await;
        guard.start(dummy_alarm(1), None).await;
        drop(guard);

        assert_eq!(sink.events(), vec![SinkEvent::Start(1, None)]);
        assert_eq!(slot.current().await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let slot = ActiveSlot::new(sink.clone());

        let mut guard = slot.lock().await;
        guard.stop().await;
        guard.start(dummy_alarm(1), None).await;
        guard.stop().await;
        guard.stop().await;
        drop(guard);

        assert_eq!(
            sink.events(),
            vec![SinkEvent::Start(1, None), SinkEvent::Stop]
        );
        assert!(slot.current().await.is_none());
    }

    #[tokio::test]
    async fn stop_if_only_matches_the_ringing_id() {
        let sink = Arc::new(RecordingSink::default());
        let slot = ActiveSlot::new(sink.clone());

        let mut guard = slot.lock().await;
        guard.start(dummy_alarm(1), None).await;
        guard.stop_if(2).await;
        assert_eq!(guard.ringing_id(), Some(1));
        guard.stop_if(1).await;
        assert_eq!(guard.ringing_id(), None);
    }
}

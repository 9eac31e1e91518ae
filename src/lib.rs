//! Alarm clock trigger engine: alarm records, the per-tick trigger
//! evaluation, snooze/dismiss semantics, and the background loop that keeps
//! a single "currently ringing" slot reconciled with the output hardware.
//!
//! All timestamps are local wall-clock `NaiveDateTime`s; the clock shows and
//! matches whatever the wall says, with no timezone conversion.

mod active;
mod alarm;
mod error;
mod registry;
mod scheduler;
mod settings;
mod sink;
mod storage;
mod trigger;

pub use active::ActiveSlot;
pub use alarm::{Alarm, AlarmId, FireTime, NewAlarm, OwnerId, UpdateAlarm};
pub use error::{Error, Result};
pub use registry::AlarmRegistry;
pub use scheduler::{AlarmClock, SchedulerHandle, TriggerScheduler};
pub use settings::Settings;
pub use sink::{NullSink, OutputSink, SoundLibrary};
pub use storage::{AlarmStorage, InMemoryStorage, JsonFileStorage};
pub use trigger::{FIRING_WINDOW_SECS, nominal_instant, should_trigger};

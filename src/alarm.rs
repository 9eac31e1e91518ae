use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type AlarmId = u64;
pub type OwnerId = i64;

/// A nominal fire time, precise to the minute. Seconds and sub-seconds are
/// zeroed on construction so the nominal instant is always the top of the
/// minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireTime(NaiveTime);

impl FireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Will never fail.");
        Self(normalized)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

// Stored and transported as "HH:MM", the format the alarm file and the API
// exchange.
impl Serialize for FireTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format("%H:%M"))
    }
}

impl<'de> Deserialize<'de> for FireTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .map(FireTime::new)
            .map_err(serde::de::Error::custom)
    }
}

/// One alarm rule. Weekdays are Monday=0 .. Sunday=6; an empty set means the
/// alarm fires every day. Timestamps are local wall-clock time with no
/// timezone attached, matching what the clock hardware shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub owner_id: OwnerId,
    pub time: FireTime,
    #[serde(default)]
    pub weekdays: Vec<u8>,
    pub enabled: bool,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub sound_ref: Option<String>,
    #[serde(default = "default_snooze_allowed")]
    pub snooze_allowed: bool,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_duration_minutes: u32,
    #[serde(default)]
    pub snooze_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_triggered: Option<NaiveDateTime>,
}

fn default_snooze_allowed() -> bool {
    true
}

fn default_snooze_minutes() -> u32 {
    5
}

/// Creation request. The registry assigns the id; `snooze_until` and
/// `last_triggered` always start empty.
#[derive(Debug, Clone)]
pub struct NewAlarm {
    pub owner_id: OwnerId,
    pub time: FireTime,
    pub weekdays: Vec<u8>,
    pub enabled: bool,
    pub label: String,
    pub sound_ref: Option<String>,
    pub snooze_allowed: bool,
    pub snooze_duration_minutes: Option<u32>,
}

impl NewAlarm {
    pub fn at(owner_id: OwnerId, time: FireTime) -> Self {
        Self {
            owner_id,
            time,
            weekdays: Vec::new(),
            enabled: true,
            label: String::new(),
            sound_ref: None,
            snooze_allowed: true,
            snooze_duration_minutes: None,
        }
    }
}

/// Patch request: only fields carrying `Some` are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateAlarm {
    pub time: Option<FireTime>,
    pub weekdays: Option<Vec<u8>>,
    pub enabled: Option<bool>,
    pub label: Option<String>,
    pub sound_ref: Option<Option<String>>,
    pub snooze_allowed: Option<bool>,
    pub snooze_duration_minutes: Option<u32>,
}

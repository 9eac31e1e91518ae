use chrono::{Datelike, Local, NaiveDateTime};

use crate::alarm::{Alarm, FireTime};

/// The whole clock runs on local wall-clock time, no timezone math anywhere.
pub(crate) fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Tolerance around the nominal instant within which a poll tick counts as
/// "now". Wide enough that a 1-second poll period cannot skip over a match.
pub const FIRING_WINDOW_SECS: i64 = 60;

/// The exact date-time `time` names on `now`'s calendar date.
pub fn nominal_instant(time: FireTime, now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(time.time())
}

pub fn weekday_index(now: NaiveDateTime) -> u8 {
    now.weekday().num_days_from_monday() as u8
}

/// Decides whether `alarm` should be firing at `now`. Pure; the scheduler
/// calls this every tick and the snooze/dismiss paths rely on its exact
/// ordering:
///
/// 1. disabled alarms never fire;
/// 2. an unexpired snooze suppresses the alarm outright;
/// 3. a non-empty weekday set must contain today;
/// 4. `now` must lie within the firing window around the nominal instant;
/// 5. an alarm that already triggered today (dismissed) stays quiet until
///    the next calendar day.
///
/// The same-day check on `last_triggered` is the only de-dup state: it
/// self-resets at midnight, so no separate re-arm pass exists. Snoozing does
/// not move the window anchor; a snooze that outlives the window pushes the
/// next fire to the next eligible day.
pub fn should_trigger(alarm: &Alarm, now: NaiveDateTime) -> bool {
    if !alarm.enabled {
        return false;
    }

    if let Some(until) = alarm.snooze_until {
        if now < until {
            return false;
        }
    }

    if !alarm.weekdays.is_empty() && !alarm.weekdays.contains(&weekday_index(now)) {
        return false;
    }

    let nominal = nominal_instant(alarm.time, now);
    if (now - nominal).num_seconds().abs() > FIRING_WINDOW_SECS {
        return false;
    }

    if let Some(last) = alarm.last_triggered {
        if last.date() == now.date() {
            return false;
        }
    }

    true
}

//! Opening-hours evaluation.
//!
//! Hours are free text entered by listing owners ("09:00-17:00",
//! "9am to 5pm", "Closed", "24/7"). Evaluation is fail-soft: anything the
//! grammar below cannot read is reported as closed.

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::listing::OpeningHoursEntry;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Range separators, tried in order. The first one present wins.
const SEPARATORS: [&str; 6] = ["-", "\u{2013}", "\u{2014}", "to", "until", "till"];

const OPENING_SOON_WINDOW_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStatus {
    pub is_open: bool,
    pub status: String,
}

impl OpeningStatus {
    #[must_use]
    pub fn closed() -> Self {
        Self {
            is_open: false,
            status: "Closed".to_string(),
        }
    }

    fn open_now() -> Self {
        Self {
            is_open: true,
            status: "Open now".to_string(),
        }
    }

    fn around_the_clock() -> Self {
        Self {
            is_open: true,
            status: "Open 24/7".to_string(),
        }
    }

    fn opening_in(minutes: i64) -> Self {
        let plural = if minutes == 1 { "" } else { "s" };
        Self {
            is_open: false,
            status: format!("Opening in {minutes} minute{plural}"),
        }
    }
}

/// English weekday name for a Sunday-based index, or `"Unknown"`.
#[must_use]
pub fn day_name(index: i32) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| DAY_NAMES.get(i).copied())
        .unwrap_or("Unknown")
}

/// Status of a listing at `now`, considering only today's entry.
#[must_use]
pub fn overall_status(entries: &[OpeningHoursEntry], now: NaiveDateTime) -> OpeningStatus {
    let today = DAY_NAMES[now.weekday().num_days_from_sunday() as usize];

    let Some(entry) = entries
        .iter()
        .find(|entry| day_name(entry.day_of_week).eq_ignore_ascii_case(today))
    else {
        return OpeningStatus::closed();
    };

    if entry.hours.trim().is_empty() {
        return OpeningStatus::closed();
    }

    evaluate(entry.day_of_week, &entry.hours, now)
}

/// Evaluate one day's hours text against `now`.
///
/// Sentinels are checked before the weekday: any text containing "closed"
/// is closed and any text containing "24" is open around the clock. Entries
/// for a day other than `now`'s are always closed.
#[must_use]
pub fn evaluate(day_of_week: i32, hours: &str, now: NaiveDateTime) -> OpeningStatus {
    let text = hours.trim().to_lowercase();
    if text.is_empty() || text.contains("closed") {
        return OpeningStatus::closed();
    }
    if text.contains("24") {
        return OpeningStatus::around_the_clock();
    }

    let today = now.weekday().num_days_from_sunday();
    if u32::try_from(day_of_week).ok() != Some(today) {
        return OpeningStatus::closed();
    }

    let Some((open, close)) = parse_range(&text) else {
        return OpeningStatus::closed();
    };

    let current = now.time();
    let is_open = if close < open {
        current >= open || current <= close
    } else {
        open <= current && current <= close
    };
    if is_open {
        return OpeningStatus::open_now();
    }

    // Not open means `current` is past `close`, so the next opening is
    // `open` later today whenever `current < open`, wrapped or not.
    if current < open {
        let wait_ms = (open - current).num_milliseconds();
        if wait_ms > 0 && wait_ms <= OPENING_SOON_WINDOW_MS {
            let minutes = (wait_ms + 59_999) / 60_000;
            return OpeningStatus::opening_in(minutes);
        }
    }

    OpeningStatus::closed()
}

fn parse_range(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let separator = SEPARATORS.iter().find(|sep| text.contains(*sep))?;

    let parts: Vec<&str> = text
        .split(separator)
        .filter(|part| !part.is_empty())
        .collect();
    let [open, close] = parts.as_slice() else {
        return None;
    };

    Some((parse_time(open.trim())?, parse_time(close.trim())?))
}

/// Parse one time token: `HH:MM[:SS]`, `h[:mm] am|pm`, or a bare hour `0..=23`.
fn parse_time(token: &str) -> Option<NaiveTime> {
    if token.is_empty() {
        return None;
    }

    if let Ok(time) = NaiveTime::parse_from_str(token, "%H:%M:%S") {
        return Some(time);
    }
    if let Ok(time) = NaiveTime::parse_from_str(token, "%H:%M") {
        return Some(time);
    }
    if let Some(time) = parse_twelve_hour(token) {
        return Some(time);
    }

    let hour: u32 = token.parse().ok()?;
    if hour <= 23 {
        NaiveTime::from_hms_opt(hour, 0, 0)
    } else {
        None
    }
}

fn parse_twelve_hour(token: &str) -> Option<NaiveTime> {
    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();

    let (clock, is_pm) = if let Some(clock) = compact.strip_suffix("am") {
        (clock, false)
    } else if let Some(clock) = compact.strip_suffix("pm") {
        (clock, true)
    } else {
        return None;
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        Some(_) => return None,
        None => (clock.parse::<u32>().ok()?, 0),
    };
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour = hour % 12 + if is_pm { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
#[path = "opening_hours_test.rs"]
mod tests;

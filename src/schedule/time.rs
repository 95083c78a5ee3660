//! Naive local timestamps, stored as `%Y-%m-%d %H:%M:%S`

use chrono::{Local, NaiveDateTime};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time (no timezone)
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT).ok()
}

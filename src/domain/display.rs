//! Headline formatting for the most recent reading
//!
//! Display formatting only; values are never converted between units.

use crate::domain::types::Measurement;
use chrono::{DateTime, Local, TimeZone};

/// Local wall-clock time of a measurement, if its timestamp is representable
pub fn local_time(m: &Measurement) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(m.timestamp_ms).single()
}

/// Abbreviated month and day, e.g. "Jun 21"
pub fn format_date(m: &Measurement) -> String {
    match local_time(m) {
        Some(dt) => dt.format("%b %d").to_string(),
        None => "--".to_string(),
    }
}

/// Hour and minute without zero padding on the hour, e.g. "6:22"
pub fn format_time(m: &Measurement) -> String {
    match local_time(m) {
        Some(dt) => dt.format("%-H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Temperature to one decimal place with unit, e.g. "21.5°C"
pub fn format_temperature(m: &Measurement) -> String {
    format!("{:.1}°C", m.temperature)
}

/// Humidity to one decimal place with unit, e.g. "48.2 %"
pub fn format_humidity(m: &Measurement) -> String {
    format!("{:.1} %", m.humidity)
}

/// Single-line summary of a reading for log output
pub fn headline(m: &Measurement) -> String {
    format!(
        "{} {} {} {}",
        format_date(m),
        format_time(m),
        format_temperature(m),
        format_humidity(m)
    )
}

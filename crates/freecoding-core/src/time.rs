//! Timestamps shown next to chat messages.
//!
//! The UI only ever displays a wall-clock label, so messages carry a
//! preformatted local `HH:MM:SS` string rather than a full datetime.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

/// Format used for message timestamps.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Formats a datetime as a message timestamp label.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Returns the current local time as a message timestamp label.
pub fn local_timestamp() -> String {
    format_timestamp(&Local::now())
}

// src/utils/time.rs

//! Run timestamps.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{AppError, Result};

/// Fixed offset for `minutes` east of UTC.
pub fn offset(minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AppError::config(format!("Invalid UTC offset: {minutes} minutes")))
}

/// Current time in the given offset.
pub fn now_in(minutes: i32) -> Result<DateTime<FixedOffset>> {
    Ok(Utc::now().with_timezone(&offset(minutes)?))
}

/// Human-readable timestamp, e.g. `Wednesday 14 October 2026 at 09:30:00 GMT+8`.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {}",
        at.format("%A %-d %B %Y at %H:%M:%S"),
        gmt_label(at.offset().local_minus_utc() / 60)
    )
}

fn gmt_label(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let (hours, mins) = (minutes.abs() / 60, minutes.abs() % 60);
    match (hours, mins) {
        (0, 0) => "GMT".to_string(),
        (h, 0) => format!("GMT{sign}{h}"),
        (h, m) => format!("GMT{sign}{h}:{m:02}"),
    }
}

//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};
use vt_core::TimeWindow;
use vt_core::cast::parse_provider_datetime;

/// Parse a window bound as RFC 3339 or as a provider-local timestamp.
///
/// Supports:
/// - RFC 3339: "2024-05-06T09:00:00Z", "2024-05-06T12:00:00+03:00"
/// - Provider layout: "2024-05-06 12:00" or "2024-05-06 12:00:00", in `offset`
pub fn parse_datetime(s: &str, offset: FixedOffset) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    match parse_provider_datetime(s, offset) {
        Ok(Some(dt)) => Ok(dt),
        _ => anyhow::bail!(
            "Invalid datetime: {s}. Use RFC 3339 (e.g., 2024-05-06T09:00:00Z) or 'YYYY-MM-DD HH:MM'"
        ),
    }
}

/// Parse `--from` / `--to` into a window.
pub fn parse_window(from: &str, to: &str, offset: FixedOffset) -> anyhow::Result<TimeWindow> {
    let start = parse_datetime(from, offset).context("invalid --from")?;
    let end = parse_datetime(to, offset).context("invalid --to")?;
    TimeWindow::new(start, end).context("invalid window")
}

/// Formats seconds as "Xh Ym" if >= 1 hour, "Xm" otherwise.
/// Negative durations are treated as 0m.
pub fn format_duration(secs: i64) -> String {
    if secs < 0 {
        return "0m".to_string();
    }
    let total_minutes = secs / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

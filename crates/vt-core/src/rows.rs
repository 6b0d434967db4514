//! Typed report rows.
//!
//! Provider rows are positional: column 0 holds the grouping label (the unit
//! name or a row number) and the dataset columns follow. Rows are built once
//! from provider output and never mutated.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cast::{CastError, RawCell, cell_at, cell_float, parse_provider_datetime};
use crate::types::ZoneName;

/// Parenthetical or bracketed annotations in zone names, e.g. `"Base (north gate)"`.
static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(\[].*?[)\]]").expect("annotation regex is valid"));

/// Strips annotations from a zone name so it matches route point names.
pub fn normalize_zone_name(raw: &str) -> String {
    ANNOTATION_RE.replace_all(raw, "").trim().to_string()
}

/// One zone (geofence) entry/exit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRow {
    /// Zone name as reported.
    pub zone_full: String,
    /// Normalized name used for route matching.
    pub zone: ZoneName,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl ZoneRow {
    /// Builds a row from `[label, zone, entry, exit]` cells.
    ///
    /// Returns `Ok(None)` when the entry time is a sentinel.
    pub fn from_cells(cells: &[RawCell], offset: FixedOffset) -> Result<Option<Self>, CastError> {
        let zone_full = cell_at(cells, 1)?.text().trim().to_string();
        let Some(start) = parse_provider_datetime(cell_at(cells, 2)?.text(), offset)? else {
            return Ok(None);
        };
        let end = parse_provider_datetime(cell_at(cells, 3)?.text(), offset)?;
        check_span(start, end)?;

        Ok(Some(Self {
            zone: zone_for(&zone_full),
            zone_full,
            start,
            end,
        }))
    }

    /// Builds a row from already-typed values.
    pub fn new(zone: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            zone_full: zone.to_string(),
            zone: zone_for(zone),
            start,
            end: Some(end),
        }
    }
}

/// Maps a raw zone name to its normalized form; placeholder names become `SPACE`.
fn zone_for(raw: &str) -> ZoneName {
    if raw.contains("---") {
        return ZoneName::space();
    }
    ZoneName::new(normalize_zone_name(raw))
        .or_else(|_| ZoneName::new(raw.trim()))
        .unwrap_or_else(|_| ZoneName::space())
}

/// A trip, parking, motohour or equipment-on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl IntervalRow {
    /// Builds a row from `[label, start, end, ...]` cells.
    pub fn from_cells(cells: &[RawCell], offset: FixedOffset) -> Result<Option<Self>, CastError> {
        let Some(start) = parse_provider_datetime(cell_at(cells, 1)?.text(), offset)? else {
            return Ok(None);
        };
        let end = parse_provider_datetime(cell_at(cells, 2)?.text(), offset)?;
        check_span(start, end)?;
        Ok(Some(Self { start, end }))
    }

    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }
}

/// A point event: fuel level, refuel, discharge or odometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentRow {
    pub at: DateTime<Utc>,
    pub value: Option<f64>,
}

impl MomentRow {
    /// Builds a row from `[label, at, value, ...]` cells.
    ///
    /// `default` is used when the value cell is a placeholder.
    pub fn from_cells(
        cells: &[RawCell],
        offset: FixedOffset,
        default: Option<f64>,
    ) -> Result<Option<Self>, CastError> {
        let Some(at) = parse_provider_datetime(cell_at(cells, 1)?.text(), offset)? else {
            return Ok(None);
        };
        let value = match cells.get(2) {
            Some(cell) => cell_float(cell, default)?,
            None => default,
        };
        Ok(Some(Self { at, value }))
    }

    pub const fn new(at: DateTime<Utc>, value: f64) -> Self {
        Self {
            at,
            value: Some(value),
        }
    }
}

fn check_span(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<(), CastError> {
    match end {
        Some(end) if end < start => Err(CastError::InvertedSpan { start, end }),
        _ => Ok(()),
    }
}

/// A raw position message as returned by the provider's message API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Unix timestamp, seconds.
    pub t: i64,
    #[serde(default)]
    pub pos: Option<RawPosition>,
}

/// Message coordinates: `x` is longitude, `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub x: f64,
    pub y: f64,
}

/// A timestamped position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionPing {
    pub at: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
}

impl PositionPing {
    /// Returns `None` for messages without a position or with an invalid timestamp.
    pub fn from_message(message: &RawMessage) -> Option<Self> {
        let pos = message.pos?;
        let at = DateTime::from_timestamp(message.t, 0)?;
        Some(Self {
            at,
            lat: pos.y,
            lon: pos.x,
        })
    }
}

/// Stable-sorts rows by `key` if they are not already ascending.
///
/// Returns true when a sort was needed. Every sweep relies on ascending input.
pub fn ensure_ascending<T>(rows: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) -> bool {
    let ascending = rows.windows(2).all(|pair| key(&pair[0]) <= key(&pair[1]));
    if !ascending {
        rows.sort_by_key(&key);
    }
    !ascending
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn cells(values: &[&str]) -> Vec<RawCell> {
        values.iter().map(|v| RawCell::from(*v)).collect()
    }

    #[test]
    fn normalizes_annotations() {
        assert_eq!(normalize_zone_name("Base (north gate)"), "Base");
        assert_eq!(normalize_zone_name("  [12] Quarry "), "Quarry");
        assert_eq!(normalize_zone_name("Yard"), "Yard");
    }

    #[test]
    fn zone_row_from_cells() {
        let row = ZoneRow::from_cells(
            &cells(&["A-101", "Base (gate 2)", "2024-05-06 10:00", "2024-05-06 10:05:30"]),
            utc(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(row.zone.as_str(), "Base");
        assert_eq!(row.zone_full, "Base (gate 2)");
        assert_eq!(
            row.end,
            Some(Utc.with_ymd_and_hms(2024, 5, 6, 10, 5, 30).unwrap())
        );
    }

    #[test]
    fn zone_row_placeholder_name_is_space() {
        let row = ZoneRow::from_cells(
            &cells(&["1", "-----", "2024-05-06 10:00", "2024-05-06 10:05"]),
            utc(),
        )
        .unwrap()
        .unwrap();
        assert!(row.zone.is_space());
    }

    #[test]
    fn unknown_start_drops_row() {
        let row = IntervalRow::from_cells(&cells(&["1", "Unknown", "2024-05-06 10:05"]), utc());
        assert_eq!(row, Ok(None));
    }

    #[test]
    fn unknown_end_keeps_open_row() {
        let row = IntervalRow::from_cells(&cells(&["1", "2024-05-06 10:00", "Unknown"]), utc())
            .unwrap()
            .unwrap();
        assert_eq!(row.end, None);
    }

    #[test]
    fn inverted_span_is_rejected() {
        let err = IntervalRow::from_cells(
            &cells(&["1", "2024-05-06 10:05", "2024-05-06 10:00"]),
            utc(),
        )
        .unwrap_err();
        assert!(matches!(err, CastError::InvertedSpan { .. }));
    }

    #[test]
    fn short_row_is_rejected() {
        let err = IntervalRow::from_cells(&cells(&["1", "2024-05-06 10:05"]), utc()).unwrap_err();
        assert_eq!(err, CastError::MissingCell { index: 2 });
    }

    #[test]
    fn moment_row_uses_default_for_placeholder_value() {
        let row = MomentRow::from_cells(&cells(&["1", "2024-05-06 10:00", "---"]), utc(), Some(0.0))
            .unwrap()
            .unwrap();
        assert_eq!(row.value, Some(0.0));
    }

    #[test]
    fn moment_row_ignores_numeric_zero_behind_placeholder() {
        let row_cells = vec![
            RawCell::from("1"),
            RawCell::from("2024-05-06 10:00"),
            RawCell::Value {
                text: "-----".to_string(),
                value: 0.0,
            },
        ];
        let level = MomentRow::from_cells(&row_cells, utc(), None).unwrap().unwrap();
        assert_eq!(level.value, None);

        let refuel = MomentRow::from_cells(&row_cells, utc(), Some(0.0)).unwrap().unwrap();
        assert_eq!(refuel.value, Some(0.0));
    }

    #[test]
    fn ping_requires_position() {
        let without = RawMessage { t: 1_714_989_600, pos: None };
        assert!(PositionPing::from_message(&without).is_none());

        let with = RawMessage {
            t: 1_714_989_600,
            pos: Some(RawPosition { x: 37.6, y: 55.7 }),
        };
        let ping = PositionPing::from_message(&with).unwrap();
        assert!((ping.lat - 55.7).abs() < f64::EPSILON);
        assert!((ping.lon - 37.6).abs() < f64::EPSILON);
    }

    #[test]
    fn ensure_ascending_sorts_out_of_order_rows() {
        let t = |m| Utc.with_ymd_and_hms(2024, 5, 6, 10, m, 0).unwrap();
        let mut rows = vec![
            IntervalRow::new(t(10), t(20)),
            IntervalRow::new(t(0), t(5)),
        ];
        assert!(ensure_ascending(&mut rows, |r| r.start));
        assert_eq!(rows[0].start, t(0));
        assert!(!ensure_ascending(&mut rows, |r| r.start));
    }
}

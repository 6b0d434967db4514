//! Provider cell parsing.
//!
//! The report provider hands out every cell either as plain text or as a
//! `{displayText, numericValue}` pair. Timestamps are provider-local and use
//! one of two layouts; unknown values are written as sentinel text rather
//! than left empty.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layout with seconds.
const LAYOUT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout without seconds.
const LAYOUT_MINUTES: &str = "%Y-%m-%d %H:%M";

/// Case-insensitive markers meaning "value unknown".
const SENTINELS: [&str; 3] = ["unknown", "неизвестно", "---"];

/// Errors raised while casting provider cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CastError {
    /// A value that is neither a recognized sentinel nor parseable.
    #[error("malformed {expected} cell: {raw:?}")]
    MalformedCell { expected: &'static str, raw: String },

    /// The row is shorter than its dataset layout requires.
    #[error("row has no column {index}")]
    MissingCell { index: usize },

    /// An interval whose end precedes its start.
    #[error("interval ends at {end} before it starts at {start}")]
    InvertedSpan {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// One cell of a provider row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    /// Display text paired with its numeric value.
    Value {
        #[serde(rename = "t", alias = "displayText")]
        text: String,
        #[serde(rename = "v", alias = "numericValue")]
        value: f64,
    },
    /// Plain display text.
    Text(String),
}

impl RawCell {
    /// Returns the display text.
    pub fn text(&self) -> &str {
        match self {
            Self::Value { text, .. } | Self::Text(text) => text,
        }
    }

    /// Returns the numeric value, if the provider supplied one.
    pub const fn numeric(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for RawCell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Returns true if `raw` is an unknown-value marker.
pub fn is_sentinel(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    SENTINELS.iter().any(|marker| lower.contains(marker))
}

/// Parses a provider-local timestamp and converts it to UTC.
///
/// Returns `Ok(None)` for sentinel values. The offset is the provider's fixed
/// UTC offset as of the call.
pub fn parse_provider_datetime(
    raw: &str,
    offset: FixedOffset,
) -> Result<Option<DateTime<Utc>>, CastError> {
    let raw = raw.trim();
    if is_sentinel(raw) {
        return Ok(None);
    }

    let layout = if raw.matches(':').count() >= 2 {
        LAYOUT_SECONDS
    } else {
        LAYOUT_MINUTES
    };
    let local = NaiveDateTime::parse_from_str(raw, layout).map_err(|_| CastError::MalformedCell {
        expected: "datetime",
        raw: raw.to_string(),
    })?;

    let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    Ok(Some(utc.and_utc()))
}

/// Parses a placeholder-tolerant number such as `"12.5 l"`.
///
/// Returns `default` when the text contains a dash or is empty; otherwise the
/// leading whitespace-delimited token must be a number.
pub fn parse_float(raw: &str, default: Option<f64>) -> Result<Option<f64>, CastError> {
    let raw = raw.trim();
    if is_number_placeholder(raw) {
        return Ok(default);
    }

    let token = raw.split_whitespace().next().unwrap_or(raw);
    token
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| CastError::MalformedCell {
            expected: "number",
            raw: raw.to_string(),
        })
}

fn is_number_placeholder(raw: &str) -> bool {
    raw.is_empty() || raw.contains('-')
}

/// Parses a cell as a number, preferring the provider's numeric value.
///
/// Placeholder display text yields `default` even when a numeric value is
/// present.
pub fn cell_float(cell: &RawCell, default: Option<f64>) -> Result<Option<f64>, CastError> {
    if is_number_placeholder(cell.text().trim()) {
        return Ok(default);
    }
    match cell.numeric() {
        Some(value) if value.is_finite() => Ok(Some(value)),
        _ => parse_float(cell.text(), default),
    }
}

/// Returns the cell at `index` or a [`CastError::MissingCell`].
pub fn cell_at(cells: &[RawCell], index: usize) -> Result<&RawCell, CastError> {
    cells.get(index).ok_or(CastError::MissingCell { index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn moscow() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn parses_layout_with_seconds() {
        let dt = parse_provider_datetime("2024-05-06 12:30:15", moscow())
            .unwrap()
            .unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 15).unwrap());
    }

    #[test]
    fn parses_layout_without_seconds() {
        let dt = parse_provider_datetime("2024-05-06 00:10", moscow())
            .unwrap()
            .unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 5, 21, 10, 0).unwrap());
    }

    #[test]
    fn sentinels_are_absent_not_errors() {
        assert_eq!(parse_provider_datetime("Unknown", moscow()), Ok(None));
        assert_eq!(parse_provider_datetime("Неизвестно", moscow()), Ok(None));
        assert_eq!(parse_provider_datetime("-----", moscow()), Ok(None));
    }

    #[test]
    fn malformed_datetime_is_an_error() {
        let err = parse_provider_datetime("06.05.2024 12:30", moscow()).unwrap_err();
        assert!(matches!(err, CastError::MalformedCell { expected: "datetime", .. }));
    }

    #[test]
    fn float_takes_leading_token() {
        assert_eq!(parse_float("12.5 l", None), Ok(Some(12.5)));
        assert_eq!(parse_float(" 40 ", None), Ok(Some(40.0)));
        assert_eq!(parse_float("3,25 km", None), Ok(Some(3.25)));
    }

    #[test]
    fn float_placeholders_use_default() {
        assert_eq!(parse_float("-----", Some(0.0)), Ok(Some(0.0)));
        assert_eq!(parse_float("", None), Ok(None));
    }

    #[test]
    fn float_rejects_garbage() {
        assert!(parse_float("abc", None).is_err());
    }

    #[test]
    fn numeric_cell_wins_over_text() {
        let cell = RawCell::Value {
            text: "12.0 l".to_string(),
            value: 12.25,
        };
        assert_eq!(cell_float(&cell, None), Ok(Some(12.25)));
        assert_eq!(cell.text(), "12.0 l");
    }

    #[test]
    fn placeholder_text_beats_numeric_zero() {
        let cell = RawCell::Value {
            text: "-----".to_string(),
            value: 0.0,
        };
        assert_eq!(cell_float(&cell, None), Ok(None));
        assert_eq!(cell_float(&cell, Some(0.0)), Ok(Some(0.0)));

        let blank = RawCell::Value {
            text: String::new(),
            value: 7.0,
        };
        assert_eq!(cell_float(&blank, None), Ok(None));
    }

    #[test]
    fn cells_deserialize_from_both_shapes() {
        let cells: Vec<RawCell> =
            serde_json::from_str(r#"["2024-05-06 10:00", {"t": "5 l", "v": 5.0}, {"displayText": "x", "numericValue": 1.5}]"#)
                .unwrap();
        assert_eq!(cells[0], RawCell::from("2024-05-06 10:00"));
        assert_eq!(cells[1].numeric(), Some(5.0));
        assert_eq!(cells[2].text(), "x");
    }

    #[test]
    fn missing_cell_reports_index() {
        let cells = vec![RawCell::from("a")];
        assert_eq!(cell_at(&cells, 2), Err(CastError::MissingCell { index: 2 }));
    }
}

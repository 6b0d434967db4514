//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A time window whose end does not come after its start.
    #[error("window end {end} must be after start {start}")]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated vehicle (unit) name.
    ///
    /// The data source keys every row collection by this name.
    UnitName, "unit name"
);

define_string_id!(
    /// A normalized zone name, as matched against route points.
    ///
    /// [`ZoneName::SPACE`] is the sentinel for "not in any route-relevant zone".
    ZoneName, "zone name"
);

impl ZoneName {
    /// Sentinel name for gaps and unmatched dwell time.
    pub const SPACE: &'static str = "SPACE";

    /// Returns the `SPACE` sentinel zone.
    #[must_use]
    pub fn space() -> Self {
        Self(Self::SPACE.to_string())
    }

    /// Returns true for the `SPACE` sentinel.
    pub fn is_space(&self) -> bool {
        self.0 == Self::SPACE
    }
}

/// A half-open UTC time range `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = ValidationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Creates a window after checking that it is not empty.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true when `[start, end]` shares a positive-length span with the window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        end.min(self.end) > start.max(self.start)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} – {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    #[test]
    fn unit_name_rejects_empty() {
        assert!(UnitName::new("").is_err());
        assert!(UnitName::new("A-101").is_ok());
    }

    #[test]
    fn zone_name_serde_roundtrip() {
        let zone = ZoneName::new("Base").unwrap();
        let json = serde_json::to_string(&zone).unwrap();
        assert_eq!(json, "\"Base\"");
        let parsed: ZoneName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, zone);
    }

    #[test]
    fn zone_name_serde_rejects_empty() {
        let result: Result<ZoneName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn space_sentinel() {
        assert!(ZoneName::space().is_space());
        assert!(!ZoneName::new("Base").unwrap().is_space());
    }

    #[test]
    fn window_rejects_empty_range() {
        assert!(TimeWindow::new(at(9, 0), at(9, 0)).is_err());
        assert!(TimeWindow::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeWindow::new(at(9, 0), at(18, 0)).is_ok());
    }

    #[test]
    fn window_serde_validates() {
        let ok: Result<TimeWindow, _> = serde_json::from_str(
            r#"{"start":"2024-05-06T09:00:00Z","end":"2024-05-06T18:00:00Z"}"#,
        );
        assert!(ok.is_ok());
        let bad: Result<TimeWindow, _> = serde_json::from_str(
            r#"{"start":"2024-05-06T18:00:00Z","end":"2024-05-06T09:00:00Z"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn window_overlap_requires_positive_span() {
        let window = TimeWindow::new(at(9, 0), at(18, 0)).unwrap();
        assert!(window.overlaps(at(8, 0), at(9, 30)));
        assert!(!window.overlaps(at(8, 0), at(9, 0)));
        assert!(!window.overlaps(at(18, 0), at(19, 0)));
    }
}

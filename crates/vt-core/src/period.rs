//! Time periods and intersection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rows::IntervalRow;

/// A closed-open span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Length in whole seconds; negative spans count as zero.
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    /// Seconds shared with `other` (zero or negative when disjoint).
    pub fn overlap_seconds(&self, other: &Self) -> i64 {
        (self.end.min(other.end) - self.start.max(other.start)).num_seconds()
    }
}

/// The part of a source interval row that falls inside one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionPeriod {
    /// The source row as reported.
    pub row: IntervalRow,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IntersectionPeriod {
    pub const fn period(&self) -> Period {
        Period::new(self.start, self.end)
    }
}

/// A point event matched to a visit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionMoment {
    pub at: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Merges periods into a sorted list of disjoint periods.
///
/// Empty and inverted periods are dropped; touching periods are joined.
pub fn merge_periods(periods: impl IntoIterator<Item = Period>) -> Vec<Period> {
    let mut sorted: Vec<Period> = periods.into_iter().filter(|p| p.end > p.start).collect();
    sorted.sort_by_key(|p| p.start);

    let mut merged: Vec<Period> = Vec::with_capacity(sorted.len());
    for period in sorted {
        if let Some(last) = merged.last_mut() {
            if period.start <= last.end {
                last.end = last.end.max(period.end);
                continue;
            }
        }
        merged.push(period);
    }
    merged
}

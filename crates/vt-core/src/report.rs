//! Typed tables and per-unit / per-fleet results.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cast::{CastError, RawCell};
use crate::dataset::DatasetKind;
use crate::pipeline::Unit;
use crate::rows::{IntervalRow, MomentRow, ZoneRow, ensure_ascending};
use crate::types::TimeWindow;
use crate::visit::Visit;

/// The typed rows of one dataset for one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable<T> {
    pub kind: DatasetKind,
    pub rows: Vec<T>,
    /// Rows rejected as malformed.
    pub dropped: usize,
    /// Rows skipped because their timestamp was an unknown-value sentinel.
    pub placeholders: usize,
    /// Provider rows arrived out of order and were sorted.
    pub reordered: bool,
}

impl<T> ReportTable<T> {
    pub const fn empty(kind: DatasetKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            dropped: 0,
            placeholders: 0,
            reordered: false,
        }
    }

    /// Casts raw provider rows, dropping and counting the ones that fail.
    ///
    /// The result is sorted by `key`, stably, if the provider order was not
    /// ascending.
    pub fn cast(
        kind: DatasetKind,
        raw: &[Vec<RawCell>],
        cast: impl Fn(&[RawCell]) -> Result<Option<T>, CastError>,
        key: impl Fn(&T) -> DateTime<Utc>,
    ) -> Self {
        let mut table = Self::empty(kind);

        for (index, cells) in raw.iter().enumerate() {
            match cast(cells) {
                Ok(Some(row)) => table.rows.push(row),
                Ok(None) => table.placeholders += 1,
                Err(e) => {
                    tracing::warn!(dataset = %kind, row = index, error = %e, "dropping malformed row");
                    table.dropped += 1;
                }
            }
        }

        table.reordered = ensure_ascending(&mut table.rows, key);
        if table.reordered {
            tracing::warn!(dataset = %kind, "rows arrived out of order, sorted by start");
        }
        table
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            kind: self.kind,
            rows: self.rows.len(),
            dropped: self.dropped,
            placeholders: self.placeholders,
            reordered: self.reordered,
        }
    }
}

/// Row counts of one table, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub kind: DatasetKind,
    pub rows: usize,
    pub dropped: usize,
    pub placeholders: usize,
    pub reordered: bool,
}

/// Everything computed for one unit over one window.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: Unit,
    pub window: TimeWindow,
    /// Name of the route the zones were matched against, if any.
    pub route_name: Option<String>,
    pub zones: ReportTable<ZoneRow>,
    pub intervals: Vec<ReportTable<IntervalRow>>,
    pub moments: Vec<ReportTable<MomentRow>>,
    /// The reconstructed timeline: contiguous, covering `window`.
    pub visits: Vec<Visit>,
}

impl UnitReport {
    pub fn stats(&self) -> Vec<TableStats> {
        std::iter::once(self.zones.stats())
            .chain(self.intervals.iter().map(ReportTable::stats))
            .chain(self.moments.iter().map(ReportTable::stats))
            .collect()
    }

    pub fn total_distance(&self) -> f64 {
        self.visits.iter().map(|v| v.total_distance).sum()
    }

    pub fn idle_seconds(&self) -> i64 {
        self.visits.iter().map(|v| v.idle_seconds).sum()
    }
}

/// A unit that produced no report, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitIssue {
    pub unit: Unit,
    pub reason: String,
}

/// Outcome of a fleet batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    pub analysed: Vec<UnitReport>,
    /// Units deliberately not reconstructed (unresolved route, untracked type).
    pub skipped: Vec<UnitIssue>,
    /// Units whose data could not be fetched.
    pub failed: Vec<UnitIssue>,
}

impl FleetReport {
    pub fn unit_count(&self) -> usize {
        self.analysed.len() + self.skipped.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<RawCell>> {
        rows.iter()
            .map(|cells| cells.iter().map(|c| RawCell::from(*c)).collect())
            .collect()
    }

    fn cast_trips(rows: &[Vec<RawCell>]) -> ReportTable<IntervalRow> {
        let utc = FixedOffset::east_opt(0).unwrap();
        ReportTable::cast(
            DatasetKind::Trips,
            rows,
            |cells| IntervalRow::from_cells(cells, utc),
            |row| row.start,
        )
    }

    #[test]
    fn test_cast_counts_dropped_and_placeholder_rows() {
        let table = cast_trips(&raw(&[
            &["1", "2024-05-06 09:00", "2024-05-06 09:30"],
            &["2", "Unknown", "2024-05-06 09:45"],
            &["3", "06.05.2024 10:00", "2024-05-06 10:30"],
            &["4", "2024-05-06 11:00", "Unknown"],
            &["5"],
        ]));

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.placeholders, 1);
        assert_eq!(table.dropped, 2);
        assert!(!table.reordered);
        assert_eq!(table.rows[1].end, None);
    }

    #[test]
    fn test_cast_sorts_out_of_order_rows() {
        let table = cast_trips(&raw(&[
            &["1", "2024-05-06 11:00", "2024-05-06 11:30"],
            &["2", "2024-05-06 09:00", "2024-05-06 09:30"],
        ]));

        assert!(table.reordered);
        assert!(table.rows[0].start < table.rows[1].start);
        let stats = table.stats();
        assert_eq!(stats.rows, 2);
        assert!(stats.reordered);
    }
}

//! Sweep-line attachment of dataset rows to visits.
//!
//! Both sweeps require `source` and `visits` to be ascending. Visits that end
//! before the current source row starts can never match a later row, so a
//! cursor moves past them for good.

use chrono::{DateTime, Utc};

use crate::period::{IntersectionMoment, IntersectionPeriod};
use crate::rows::{IntervalRow, MomentRow};
use crate::visit::{IntervalKind, MomentKind, Visit};

/// How many visits a single moment may be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentMatch {
    /// The first containing visit only. For volume events, so nothing is
    /// counted twice.
    First,
    /// Every containing visit. A reading on a boundary seeds both neighbours.
    Every,
}

impl MomentMatch {
    /// The matching mode used for each moment dataset.
    #[must_use]
    pub const fn for_kind(kind: MomentKind) -> Self {
        match kind {
            MomentKind::Refuels | MomentKind::Discharges => Self::First,
            MomentKind::FuelLevels | MomentKind::Odometer => Self::Every,
        }
    }
}

/// Attaches the positive overlap of each interval row to every visit it
/// intersects. Open-ended rows run to `open_end`.
///
/// Returns the number of intersection records created.
pub fn attach_intervals(
    source: &[IntervalRow],
    visits: &mut [Visit],
    kind: IntervalKind,
    open_end: DateTime<Utc>,
) -> usize {
    let mut cursor = 0;
    let mut attached = 0;

    for row in source {
        let row_end = row.end.unwrap_or(open_end);

        while cursor < visits.len() && visits[cursor].exit < row.start {
            cursor += 1;
        }

        for visit in &mut visits[cursor..] {
            if visit.entry > row_end {
                break;
            }

            let start = visit.entry.max(row.start);
            let end = visit.exit.min(row_end);
            let seconds = (end - start).num_seconds();
            if seconds <= 0 {
                continue;
            }

            let attachment = visit.intervals_mut(kind);
            attachment.periods.push(IntersectionPeriod {
                row: *row,
                start,
                end,
            });
            attachment.total_seconds += seconds;
            attached += 1;
        }
    }

    attached
}

/// Attaches each moment to the visits whose `[entry, exit]` contains it.
///
/// In [`MomentMatch::First`] mode the moment value is also added to the
/// attachment's `volume`. Returns the number of moments placed at least once.
pub fn attach_moments(
    source: &[MomentRow],
    visits: &mut [Visit],
    kind: MomentKind,
    matching: MomentMatch,
) -> usize {
    let mut cursor = 0;
    let mut placed = 0;

    for moment in source {
        while cursor < visits.len() && visits[cursor].exit < moment.at {
            cursor += 1;
        }

        let mut matched = false;
        for visit in &mut visits[cursor..] {
            if visit.entry > moment.at {
                break;
            }

            let attachment = visit.moments_mut(kind);
            attachment.moments.push(IntersectionMoment {
                at: moment.at,
                value: moment.value,
            });
            matched = true;

            if matching == MomentMatch::First {
                attachment.volume += moment.value.unwrap_or(0.0);
                break;
            }
        }

        if matched {
            placed += 1;
        } else {
            tracing::trace!(at = %moment.at, kind = ?kind, "moment outside every visit");
        }
    }

    placed
}

//! Zone visit reconstruction.
//!
//! Turns the provider's raw zone entry/exit rows into a gapless visit
//! timeline covering the requested window.
//!
//! # Algorithm Summary
//!
//! 1. Keep rows whose zone is on the route (all rows for fixed routes) and
//!    that overlap the window (and the shift, when one applies)
//! 2. Walk rows in entry order, merging short gaps, dropping short blips and
//!    filling long gaps with `SPACE`
//! 3. Clip or pad both ends so the timeline covers the window exactly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::route::ResolvedRoute;
use crate::rows::ZoneRow;
use crate::types::TimeWindow;
use crate::visit::Visit;

/// Thresholds for smoothing the zone timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Gaps up to this length between rows are closed instead of filled.
    /// Default: 60.
    pub merge_gap_secs: i64,

    /// Dwell shorter than this, bracketed by the same zone, is noise.
    /// Default: 60.
    pub noise_dwell_secs: i64,

    /// A first visit starting this close to the window start is stretched to it.
    /// Default: 180.
    pub start_allowance_secs: i64,

    /// A last visit ending this close to the window end is stretched to it.
    /// Default: 180.
    pub end_allowance_secs: i64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            merge_gap_secs: 60,
            noise_dwell_secs: 60,
            start_allowance_secs: 180,
            end_allowance_secs: 180,
        }
    }
}

/// Rebuilds the visit timeline for one unit.
///
/// Rows must be sorted by entry time ascending. `engine_off_at` is the end of
/// the unit's last motohour interval; when given and it falls strictly inside
/// the last visit, that visit is split there.
///
/// The result is contiguous and spans exactly `window`.
pub fn reconstruct_visits(
    rows: &[ZoneRow],
    route: &ResolvedRoute,
    window: &TimeWindow,
    config: &SmoothingConfig,
    engine_off_at: Option<DateTime<Utc>>,
) -> Vec<Visit> {
    let rows: Vec<&ZoneRow> = rows
        .iter()
        .filter(|row| route.filter.accepts(&row.zone))
        .filter(|row| window.overlaps(row.start, row_exit(row, window)))
        .filter(|row| {
            route.shift_window.is_none_or(|shift| {
                row_exit(row, window).min(shift.end) > row.start.max(shift.start)
            })
        })
        .collect();

    let mut visits = smooth(&rows, window, config);
    // Clipping overlaps can push entries past the window end
    visits.retain(|visit| window.overlaps(visit.entry, visit.exit));
    if visits.is_empty() {
        return vec![Visit::space(window.start(), window.end())];
    }

    pad_start(&mut visits, window, config.start_allowance_secs);
    if let Some(at) = engine_off_at.filter(|at| *at < window.end()) {
        split_last_visit(&mut visits, at);
    }
    pad_end(&mut visits, window, config.end_allowance_secs);

    visits
}

fn row_exit(row: &ZoneRow, window: &TimeWindow) -> DateTime<Utc> {
    row.end.unwrap_or_else(|| window.end())
}

fn smooth(rows: &[&ZoneRow], window: &TimeWindow, config: &SmoothingConfig) -> Vec<Visit> {
    let mut visits: Vec<Visit> = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let mut current = Visit::new(
            row.zone.clone(),
            row.zone_full.clone(),
            row.start,
            row_exit(row, window),
        );

        let Some(previous) = visits.last_mut() else {
            visits.push(current);
            continue;
        };

        let gap = (current.entry - previous.exit).num_seconds();

        if gap > 0 && gap <= config.merge_gap_secs {
            if current.zone == previous.zone {
                previous.exit = current.exit;
                continue;
            }

            // Close the gap on the previous side
            previous.exit = current.entry;

            let is_blip = current.duration_seconds() < config.noise_dwell_secs;
            if is_blip && rows.get(i + 1).is_some_and(|next| next.zone == previous.zone) {
                tracing::debug!(
                    zone = %current.zone,
                    entry = %current.entry,
                    "dropping short dwell bracketed by {}",
                    previous.zone
                );
                previous.exit = current.exit;
                continue;
            }
            visits.push(current);
        } else if gap > config.merge_gap_secs {
            if previous.is_space() && current.is_space() {
                previous.exit = current.exit;
                continue;
            }
            if previous.is_space() {
                previous.exit = current.entry;
            } else if current.is_space() {
                current.entry = previous.exit;
            } else {
                let space = Visit::space(previous.exit, current.entry);
                visits.push(space);
            }
            visits.push(current);
        } else if current.zone == previous.zone {
            previous.exit = previous.exit.max(current.exit);
        } else if gap < 0 {
            if current.exit <= previous.exit {
                tracing::debug!(
                    zone = %current.zone,
                    entry = %current.entry,
                    "dropping zone row nested inside {}",
                    previous.zone
                );
                continue;
            }
            current.entry = previous.exit;
            visits.push(current);
        } else {
            visits.push(current);
        }
    }

    visits
}

fn pad_start(visits: &mut Vec<Visit>, window: &TimeWindow, allowance_secs: i64) {
    let Some(first) = visits.first_mut() else {
        return;
    };

    let lead = (first.entry - window.start()).num_seconds();
    if lead < allowance_secs.max(0) || first.is_space() {
        first.entry = window.start();
    } else if lead > 0 {
        let space = Visit::space(window.start(), first.entry);
        visits.insert(0, space);
    }
}

fn pad_end(visits: &mut Vec<Visit>, window: &TimeWindow, allowance_secs: i64) {
    let Some(last) = visits.last_mut() else {
        return;
    };

    let trail = (window.end() - last.exit).num_seconds();
    if trail < allowance_secs.max(0) || last.is_space() {
        last.exit = window.end();
    } else if trail > 0 {
        let space = Visit::space(last.exit, window.end());
        visits.push(space);
    }
}

/// Splits the last visit at `at` when it lies strictly inside it.
///
/// Both halves keep the zone.
pub fn split_last_visit(visits: &mut Vec<Visit>, at: DateTime<Utc>) {
    let Some(last) = visits.last_mut() else {
        return;
    };
    if !(last.entry < at && at < last.exit) {
        return;
    }

    let tail = Visit::new(last.zone.clone(), last.zone_full.clone(), at, last.exit);
    last.exit = at;
    tracing::debug!(zone = %tail.zone, at = %at, "split last visit at engine off");
    visits.push(tail);
}

/// Returns true when `visits` are contiguous and span exactly `window`.
pub fn covers_window(visits: &[Visit], window: &TimeWindow) -> bool {
    let (Some(first), Some(last)) = (visits.first(), visits.last()) else {
        return false;
    };
    first.entry == window.start()
        && last.exit == window.end()
        && visits.windows(2).all(|pair| pair[0].exit == pair[1].entry)
        && visits.iter().all(|v| v.exit >= v.entry)
}

/// Re-expresses visits as zone rows, e.g. to re-run smoothing on a result.
pub fn visits_as_rows(visits: &[Visit]) -> Vec<ZoneRow> {
    visits
        .iter()
        .map(|visit| ZoneRow {
            zone_full: visit.zone_full.clone(),
            zone: visit.zone.clone(),
            start: visit.entry,
            end: Some(visit.exit),
        })
        .collect()
}

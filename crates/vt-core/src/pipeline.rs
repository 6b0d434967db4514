//! Per-unit analysis and fleet batches.
//!
//! A unit's pipeline casts its raw tables, rebuilds the zone timeline, then
//! attaches every other dataset to it. Units are independent, so a fleet batch
//! runs them in parallel against one shared source session.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cast::RawCell;
use crate::dataset::DatasetKind;
use crate::idle::apply_idle;
use crate::odometer::build_odometer;
use crate::reconstruct::{SmoothingConfig, covers_window, reconstruct_visits};
use crate::report::{FleetReport, ReportTable, UnitIssue, UnitReport};
use crate::route::{RouteCatalog, RouteUnresolved, Shift, ShiftStore, resolve_route};
use crate::rows::{IntervalRow, MomentRow, PositionPing, RawMessage, ZoneRow, ensure_ascending};
use crate::sweep::{MomentMatch, attach_intervals, attach_moments};
use crate::types::{TimeWindow, UnitName};
use crate::visit::{IntervalKind, MomentKind};

/// Moment datasets fetched as tables; odometer readings are derived.
const MOMENT_TABLES: [MomentKind; 3] = [
    MomentKind::Refuels,
    MomentKind::Discharges,
    MomentKind::FuelLevels,
];

/// Tunables for a unit's analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default: 180.
    pub start_allowance_secs: i64,

    /// Default: 180.
    pub end_allowance_secs: i64,

    /// Default: 60.
    pub merge_gap_secs: i64,

    /// Default: 60.
    pub noise_dwell_secs: i64,

    /// Split the last visit where the last motohour interval ends.
    /// Default: false.
    pub split_last_visit_by_engine_off: bool,

    /// Default: true.
    pub calc_idle: bool,

    /// Derive odometer readings from position messages.
    /// Default: true.
    pub calc_odometer: bool,

    /// Datasets to process; `None` means all. Zone visits are always processed.
    pub datasets: Option<Vec<DatasetKind>>,

    /// Case-insensitive route name markers of fixed (accept-all) routes.
    pub fixed_route_markers: Vec<String>,

    /// Vehicle types to analyse; empty means every unit.
    pub mobile_vehicle_types: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let smoothing = SmoothingConfig::default();
        Self {
            start_allowance_secs: smoothing.start_allowance_secs,
            end_allowance_secs: smoothing.end_allowance_secs,
            merge_gap_secs: smoothing.merge_gap_secs,
            noise_dwell_secs: smoothing.noise_dwell_secs,
            split_last_visit_by_engine_off: false,
            calc_idle: true,
            calc_odometer: true,
            datasets: None,
            fixed_route_markers: vec!["фиксир".to_string(), "fixed".to_string()],
            mobile_vehicle_types: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub const fn smoothing(&self) -> SmoothingConfig {
        SmoothingConfig {
            merge_gap_secs: self.merge_gap_secs,
            noise_dwell_secs: self.noise_dwell_secs,
            start_allowance_secs: self.start_allowance_secs,
            end_allowance_secs: self.end_allowance_secs,
        }
    }

    /// True when `kind` should be casted and attached.
    pub fn wants(&self, kind: DatasetKind) -> bool {
        match kind {
            DatasetKind::ZoneVisits => true,
            DatasetKind::Odometer if !self.calc_odometer => false,
            _ => self
                .datasets
                .as_ref()
                .is_none_or(|selected| selected.contains(&kind)),
        }
    }

    /// True when the unit's vehicle type is one we analyse.
    ///
    /// Units without a vehicle type are always analysed.
    pub fn tracks(&self, unit: &Unit) -> bool {
        let vehicle_type = unit.vehicle_type.as_deref().map_or("", str::trim);
        if self.mobile_vehicle_types.is_empty() || vehicle_type.is_empty() {
            return true;
        }
        let vehicle_type = vehicle_type.to_lowercase();
        self.mobile_vehicle_types
            .iter()
            .any(|tracked| tracked.trim().to_lowercase() == vehicle_type)
    }
}

/// A vehicle known to the report source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: u64,
    pub name: UnitName,
    #[serde(default)]
    pub vehicle_type: Option<String>,
}

/// Raw provider output for one unit and window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDatasets {
    /// Provider rows per dataset, as returned.
    #[serde(default)]
    pub tables: BTreeMap<DatasetKind, Vec<Vec<RawCell>>>,
    /// Raw position messages.
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

impl RawDatasets {
    pub fn table(&self, kind: DatasetKind) -> &[Vec<RawCell>] {
        self.tables.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Errors surfaced by a report source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unit {0} is not known to the source")]
    UnknownUnit(u64),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Why a unit produced no report.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    RouteUnresolved(#[from] RouteUnresolved),

    #[error("vehicle type {vehicle_type:?} is not analysed")]
    Untracked { vehicle_type: Option<String> },

    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
}

impl UnitError {
    /// Skips are deliberate; everything else is a failure.
    pub const fn is_skip(&self) -> bool {
        !matches!(self, Self::SourceUnavailable(_))
    }
}

/// A report source that hands out one session per batch.
pub trait ReportSource {
    type Session<'a>: ReportSession
    where
        Self: 'a;

    /// Acquires a session. It is released when dropped.
    fn acquire(&self) -> Result<Self::Session<'_>, SourceError>;
}

/// A live source session, shared by all units of a batch.
pub trait ReportSession: Sync {
    fn fetch(&self, unit: &Unit, window: &TimeWindow) -> Result<RawDatasets, SourceError>;
}

/// Inputs shared by every unit of a batch.
#[derive(Debug)]
pub struct AnalysisContext<'a, C: ?Sized> {
    pub catalog: &'a C,
    pub window: TimeWindow,
    pub config: &'a AnalysisConfig,
    /// The provider's fixed UTC offset.
    pub offset: FixedOffset,
}

/// Analyses one unit from already-fetched data.
pub fn analyze_unit<C: RouteCatalog + ?Sized>(
    ctx: &AnalysisContext<'_, C>,
    unit: &Unit,
    raw: &RawDatasets,
    shift: Option<&Shift>,
) -> Result<UnitReport, UnitError> {
    let config = ctx.config;
    let window = ctx.window;
    let offset = ctx.offset;

    if !config.tracks(unit) {
        return Err(UnitError::Untracked {
            vehicle_type: unit.vehicle_type.clone(),
        });
    }

    let route = resolve_route(shift, ctx.catalog, &config.fixed_route_markers)?;

    let zones = ReportTable::cast(
        DatasetKind::ZoneVisits,
        raw.table(DatasetKind::ZoneVisits),
        |cells| ZoneRow::from_cells(cells, offset),
        |row| row.start,
    );

    let intervals: Vec<(IntervalKind, ReportTable<IntervalRow>)> = IntervalKind::ALL
        .into_iter()
        .filter(|kind| config.wants(kind.dataset()))
        .map(|kind| {
            let table = ReportTable::cast(
                kind.dataset(),
                raw.table(kind.dataset()),
                |cells| IntervalRow::from_cells(cells, offset),
                |row| row.start,
            );
            (kind, table)
        })
        .collect();

    let mut moments: Vec<(MomentKind, ReportTable<MomentRow>)> = MOMENT_TABLES
        .into_iter()
        .filter(|kind| config.wants(kind.dataset()))
        .map(|kind| {
            let default = match kind {
                MomentKind::Refuels | MomentKind::Discharges => Some(0.0),
                MomentKind::FuelLevels | MomentKind::Odometer => None,
            };
            let table = ReportTable::cast(
                kind.dataset(),
                raw.table(kind.dataset()),
                |cells| MomentRow::from_cells(cells, offset, default),
                |row| row.at,
            );
            (kind, table)
        })
        .collect();
    if config.wants(DatasetKind::Odometer) {
        moments.push((MomentKind::Odometer, odometer_table(&raw.messages)));
    }

    let engine_off_at = if config.split_last_visit_by_engine_off {
        last_engine_off(&intervals)
    } else {
        None
    };

    let mut visits = reconstruct_visits(
        &zones.rows,
        &route,
        &window,
        &config.smoothing(),
        engine_off_at,
    );
    debug_assert!(covers_window(&visits, &window));

    for (kind, table) in &intervals {
        attach_intervals(&table.rows, &mut visits, *kind, window.end());
    }
    for (kind, table) in &moments {
        attach_moments(&table.rows, &mut visits, *kind, MomentMatch::for_kind(*kind));
    }

    for visit in &mut visits {
        visit.settle_fuel_levels();
        visit.settle_odometer();
        if config.wants(DatasetKind::Motohours) {
            visit.settle_engine_off();
        }
        if config.calc_idle {
            apply_idle(visit);
        }
    }

    tracing::info!(
        unit = %unit.name,
        route = route.route_name.as_deref().unwrap_or("-"),
        visits = visits.len(),
        "unit analysed"
    );

    Ok(UnitReport {
        unit: unit.clone(),
        window,
        route_name: route.route_name,
        zones,
        intervals: intervals.into_iter().map(|(_, table)| table).collect(),
        moments: moments.into_iter().map(|(_, table)| table).collect(),
        visits,
    })
}

fn odometer_table(messages: &[RawMessage]) -> ReportTable<MomentRow> {
    let mut pings: Vec<PositionPing> = messages.iter().filter_map(PositionPing::from_message).collect();
    let mut table = ReportTable::empty(DatasetKind::Odometer);
    table.placeholders = messages.len() - pings.len();
    table.reordered = ensure_ascending(&mut pings, |ping| ping.at);
    if table.reordered {
        tracing::warn!(dataset = %DatasetKind::Odometer, "messages arrived out of order, sorted by time");
    }
    table.rows = build_odometer(&pings);
    table
}

/// End of the latest motohour interval, when it is known.
fn last_engine_off(intervals: &[(IntervalKind, ReportTable<IntervalRow>)]) -> Option<DateTime<Utc>> {
    intervals
        .iter()
        .find(|(kind, _)| *kind == IntervalKind::Motohours)
        .and_then(|(_, table)| table.rows.last())
        .and_then(|row| row.end)
}

/// Analyses every unit over one window.
///
/// The source session is acquired once and shared. Per-unit problems never
/// abort the batch: they are logged and reported as skipped or failed units.
pub fn analyze_fleet<S, St, C>(
    ctx: &AnalysisContext<'_, C>,
    source: &S,
    shifts: &St,
    units: &[Unit],
) -> Result<FleetReport, SourceError>
where
    S: ReportSource + ?Sized,
    St: ShiftStore + Sync + ?Sized,
    C: RouteCatalog + Sync + ?Sized,
{
    let session = source.acquire()?;

    let outcomes: Vec<(&Unit, Result<UnitReport, UnitError>)> = units
        .par_iter()
        .map(|unit| {
            let outcome = if ctx.config.tracks(unit) {
                session
                    .fetch(unit, &ctx.window)
                    .map_err(UnitError::from)
                    .and_then(|raw| analyze_unit(ctx, unit, &raw, shifts.shift_for(unit.id).as_ref()))
            } else {
                Err(UnitError::Untracked {
                    vehicle_type: unit.vehicle_type.clone(),
                })
            };
            (unit, outcome)
        })
        .collect();

    let mut fleet = FleetReport::default();
    for (unit, outcome) in outcomes {
        match outcome {
            Ok(report) => fleet.analysed.push(report),
            Err(e) => {
                let issue = UnitIssue {
                    unit: unit.clone(),
                    reason: e.to_string(),
                };
                if e.is_skip() {
                    tracing::warn!(unit = %unit.name, reason = %e, "skipping unit");
                    fleet.skipped.push(issue);
                } else {
                    tracing::warn!(unit = %unit.name, error = %e, "unit failed");
                    fleet.failed.push(issue);
                }
            }
        }
    }

    Ok(fleet)
}

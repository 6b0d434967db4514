//! Core domain logic for vehicle visit timelines.
//!
//! This crate contains the fundamental types and logic for:
//! - Casting: turning raw provider cells into typed, UTC-timestamped rows
//! - Reconstruction: stitching zone rows into a gapless visit timeline
//! - Attachment: sweeping trips, motohours, fuel events and odometer readings onto visits
//! - Idle time: engine-on time not explained by trips or equipment work

pub mod cast;
pub mod dataset;
pub mod idle;
pub mod odometer;
pub mod period;
pub mod pipeline;
pub mod reconstruct;
pub mod report;
pub mod route;
pub mod rows;
pub mod sweep;
pub mod types;
pub mod visit;

pub use cast::{CastError, RawCell};
pub use dataset::{DatasetKind, UnknownDatasetKind};
pub use pipeline::{
    AnalysisConfig, AnalysisContext, RawDatasets, ReportSession, ReportSource, SourceError, Unit,
    UnitError, analyze_fleet, analyze_unit,
};
pub use reconstruct::{SmoothingConfig, covers_window, reconstruct_visits};
pub use report::{FleetReport, ReportTable, TableStats, UnitIssue, UnitReport};
pub use route::{Route, RouteCatalog, RoutePoint, RouteUnresolved, Shift, ShiftStore};
pub use types::{TimeWindow, UnitName, ValidationError, ZoneName};
pub use visit::{IntervalKind, MomentKind, Visit};

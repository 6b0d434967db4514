//! Report source backed by a JSON file.
//!
//! The file holds what the provider and the shift store would return for a
//! batch: per-unit raw tables and messages, the route catalog and shifts.
//!
//! ```json
//! {
//!   "units": [{
//!     "id": 1, "name": "A-101", "vehicle_type": "truck",
//!     "tables": { "геозоны": [["A-101", "Base", "2024-05-06 09:00", "2024-05-06 10:00"]] },
//!     "messages": [{ "t": 1714986000, "pos": { "x": 37.6, "y": 55.7 } }]
//!   }],
//!   "routes": [{ "id": 7, "name": "North loop", "points": [{ "name": "Base" }] }],
//!   "shifts": [{ "unit_id": 1, "route_id": 7, "begin": "...", "end": "..." }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use vt_core::{
    RawDatasets, ReportSession, ReportSource, Route, Shift, SourceError, TimeWindow, Unit,
    UnitName,
};

#[derive(Debug, Deserialize)]
struct FileUnit {
    id: u64,
    name: UnitName,
    #[serde(default)]
    vehicle_type: Option<String>,
    #[serde(flatten)]
    data: RawDatasets,
}

#[derive(Debug, Deserialize)]
struct ReportFile {
    units: Vec<FileUnit>,
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    shifts: Vec<Shift>,
}

/// Units, raw data, routes and shifts read from one report file.
#[derive(Debug)]
pub struct FileSource {
    pub units: Vec<Unit>,
    pub routes: Vec<Route>,
    pub shifts: Vec<Shift>,
    data: HashMap<u64, RawDatasets>,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ReportFile = serde_json::from_str(content)?;

        let mut units = Vec::with_capacity(file.units.len());
        let mut data = HashMap::with_capacity(file.units.len());
        for entry in file.units {
            units.push(Unit {
                id: entry.id,
                name: entry.name,
                vehicle_type: entry.vehicle_type,
            });
            data.insert(entry.id, entry.data);
        }

        Ok(Self {
            units,
            routes: file.routes,
            shifts: file.shifts,
            data,
        })
    }
}

/// A read-only view of the file's unit data.
#[derive(Debug)]
pub struct FileSession<'a> {
    data: &'a HashMap<u64, RawDatasets>,
}

impl ReportSource for FileSource {
    type Session<'a> = FileSession<'a>;

    fn acquire(&self) -> Result<Self::Session<'_>, SourceError> {
        Ok(FileSession { data: &self.data })
    }
}

impl ReportSession for FileSession<'_> {
    fn fetch(&self, unit: &Unit, _window: &TimeWindow) -> Result<RawDatasets, SourceError> {
        self.data
            .get(&unit.id)
            .cloned()
            .ok_or(SourceError::UnknownUnit(unit.id))
    }
}

//! Visits - contiguous stretches of time attributed to one zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetKind;
use crate::period::{IntersectionMoment, IntersectionPeriod, Period};
use crate::types::ZoneName;

/// Interval datasets that can be attached to a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    Trips,
    Parkings,
    Motohours,
    EquipmentOn,
}

impl IntervalKind {
    pub const ALL: [Self; 4] = [Self::Trips, Self::Parkings, Self::Motohours, Self::EquipmentOn];

    #[must_use]
    pub const fn dataset(self) -> DatasetKind {
        match self {
            Self::Trips => DatasetKind::Trips,
            Self::Parkings => DatasetKind::Parkings,
            Self::Motohours => DatasetKind::Motohours,
            Self::EquipmentOn => DatasetKind::EquipmentOn,
        }
    }
}

/// Moment datasets that can be attached to a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MomentKind {
    Refuels,
    Discharges,
    FuelLevels,
    Odometer,
}

impl MomentKind {
    #[must_use]
    pub const fn dataset(self) -> DatasetKind {
        match self {
            Self::Refuels => DatasetKind::Refuels,
            Self::Discharges => DatasetKind::Discharges,
            Self::FuelLevels => DatasetKind::FuelLevels,
            Self::Odometer => DatasetKind::Odometer,
        }
    }
}

/// Interval rows overlapping a visit, clipped to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalAttachment {
    pub periods: Vec<IntersectionPeriod>,
    /// Sum of the clipped periods, in seconds.
    pub total_seconds: i64,
}

/// Moments falling inside a visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentAttachment {
    pub moments: Vec<IntersectionMoment>,
    /// Sum of the moment values (refuel and discharge volumes).
    pub volume: f64,
}

impl MomentAttachment {
    /// Value of the earliest matched moment.
    pub fn first_value(&self) -> Option<f64> {
        self.moments.iter().find_map(|m| m.value)
    }

    /// Value of the latest matched moment.
    pub fn last_value(&self) -> Option<f64> {
        self.moments.iter().rev().find_map(|m| m.value)
    }
}

/// A stay in one zone, with everything that happened during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Normalized zone name, or `SPACE`.
    pub zone: ZoneName,
    /// Zone name as reported by the provider.
    pub zone_full: String,
    pub entry: DateTime<Utc>,
    pub exit: DateTime<Utc>,

    pub trips: IntervalAttachment,
    pub parkings: IntervalAttachment,
    pub motohours: IntervalAttachment,
    pub equipment_on: IntervalAttachment,

    pub refuels: MomentAttachment,
    pub discharges: MomentAttachment,
    pub fuel_levels: MomentAttachment,
    pub odometer: MomentAttachment,

    /// Engine-on periods not explained by trips or equipment work.
    pub idle_periods: Vec<Period>,
    pub idle_seconds: i64,
    /// Time in the visit not covered by motohours.
    pub engine_off_seconds: i64,

    pub start_odometer: Option<f64>,
    pub end_odometer: Option<f64>,
    /// Kilometres driven during the visit.
    pub total_distance: f64,
    pub start_fuel_level: Option<f64>,
    pub end_fuel_level: Option<f64>,
}

impl Visit {
    pub fn new(zone: ZoneName, zone_full: impl Into<String>, entry: DateTime<Utc>, exit: DateTime<Utc>) -> Self {
        Self {
            zone,
            zone_full: zone_full.into(),
            entry,
            exit,
            trips: IntervalAttachment::default(),
            parkings: IntervalAttachment::default(),
            motohours: IntervalAttachment::default(),
            equipment_on: IntervalAttachment::default(),
            refuels: MomentAttachment::default(),
            discharges: MomentAttachment::default(),
            fuel_levels: MomentAttachment::default(),
            odometer: MomentAttachment::default(),
            idle_periods: Vec::new(),
            idle_seconds: 0,
            engine_off_seconds: 0,
            start_odometer: None,
            end_odometer: None,
            total_distance: 0.0,
            start_fuel_level: None,
            end_fuel_level: None,
        }
    }

    /// A `SPACE` visit covering `[entry, exit)`.
    pub fn space(entry: DateTime<Utc>, exit: DateTime<Utc>) -> Self {
        Self::new(ZoneName::space(), ZoneName::SPACE, entry, exit)
    }

    pub fn is_space(&self) -> bool {
        self.zone.is_space()
    }

    pub const fn period(&self) -> Period {
        Period::new(self.entry, self.exit)
    }

    pub fn duration_seconds(&self) -> i64 {
        self.period().seconds()
    }

    /// Sets `engine_off_seconds` from the attached motohours.
    pub fn settle_engine_off(&mut self) {
        self.engine_off_seconds = (self.duration_seconds() - self.motohours.total_seconds).max(0);
    }

    /// Fuel level change over the visit, when both ends were observed.
    pub fn fuel_delta(&self) -> Option<f64> {
        Some(self.end_fuel_level? - self.start_fuel_level?)
    }

    pub fn intervals_mut(&mut self, kind: IntervalKind) -> &mut IntervalAttachment {
        match kind {
            IntervalKind::Trips => &mut self.trips,
            IntervalKind::Parkings => &mut self.parkings,
            IntervalKind::Motohours => &mut self.motohours,
            IntervalKind::EquipmentOn => &mut self.equipment_on,
        }
    }

    pub fn moments_mut(&mut self, kind: MomentKind) -> &mut MomentAttachment {
        match kind {
            MomentKind::Refuels => &mut self.refuels,
            MomentKind::Discharges => &mut self.discharges,
            MomentKind::FuelLevels => &mut self.fuel_levels,
            MomentKind::Odometer => &mut self.odometer,
        }
    }

    /// Copies first/last fuel readings into the start/end scalars.
    pub fn settle_fuel_levels(&mut self) {
        self.start_fuel_level = self.fuel_levels.first_value();
        self.end_fuel_level = self.fuel_levels.last_value();
    }

    /// Copies first/last odometer readings into the start/end scalars.
    pub fn settle_odometer(&mut self) {
        self.start_odometer = self.odometer.first_value();
        self.end_odometer = self.odometer.last_value();
        self.total_distance = match (self.start_odometer, self.end_odometer) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    fn moment(h: u32, value: f64) -> IntersectionMoment {
        IntersectionMoment {
            at: at(h, 0),
            value: Some(value),
        }
    }

    #[test]
    fn space_visit() {
        let visit = Visit::space(at(9, 0), at(10, 0));
        assert!(visit.is_space());
        assert_eq!(visit.zone_full, "SPACE");
        assert_eq!(visit.duration_seconds(), 3600);
    }

    #[test]
    fn engine_off_never_negative() {
        let mut visit = Visit::new(ZoneName::new("Base").unwrap(), "Base", at(9, 0), at(10, 0));
        visit.motohours.total_seconds = 1200;
        visit.settle_engine_off();
        assert_eq!(visit.engine_off_seconds, 2400);
        visit.motohours.total_seconds = 7200;
        visit.settle_engine_off();
        assert_eq!(visit.engine_off_seconds, 0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "values are exact in these fixtures")]
    fn settle_odometer_uses_first_and_last() {
        let mut visit = Visit::space(at(9, 0), at(12, 0));
        visit.odometer.moments = vec![moment(9, 10.0), moment(10, 15.5), moment(11, 22.0)];
        visit.settle_odometer();
        assert_eq!(visit.start_odometer, Some(10.0));
        assert_eq!(visit.end_odometer, Some(22.0));
        assert_eq!(visit.total_distance, 12.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "values are exact in these fixtures")]
    fn settle_without_readings() {
        let mut visit = Visit::space(at(9, 0), at(12, 0));
        visit.settle_odometer();
        visit.settle_fuel_levels();
        assert_eq!(visit.start_odometer, None);
        assert_eq!(visit.total_distance, 0.0);
        assert_eq!(visit.fuel_delta(), None);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "values are exact in these fixtures")]
    fn fuel_delta_from_levels() {
        let mut visit = Visit::space(at(9, 0), at(12, 0));
        visit.fuel_levels.moments = vec![moment(9, 80.0), moment(11, 62.5)];
        visit.settle_fuel_levels();
        assert_eq!(visit.fuel_delta(), Some(-17.5));
    }

    #[test]
    fn attachment_accessors_address_fields() {
        let mut visit = Visit::space(at(9, 0), at(12, 0));
        visit.intervals_mut(IntervalKind::Parkings).total_seconds = 60;
        assert_eq!(visit.parkings.total_seconds, 60);
        visit.moments_mut(MomentKind::Refuels).volume = 40.0;
        assert!((visit.refuels.volume - 40.0).abs() < f64::EPSILON);
        assert_eq!(IntervalKind::EquipmentOn.dataset(), DatasetKind::EquipmentOn);
    }
}

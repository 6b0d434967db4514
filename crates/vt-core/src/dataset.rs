//! Dataset kind enum as the single source of truth for table names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row collections a report source can return for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetKind {
    ZoneVisits,
    Trips,
    Parkings,
    Motohours,
    EquipmentOn,
    Discharges,
    Refuels,
    FuelLevels,
    Odometer,
}

impl DatasetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZoneVisits => "zone_visits",
            Self::Trips => "trips",
            Self::Parkings => "parkings",
            Self::Motohours => "motohours",
            Self::EquipmentOn => "equipment_on",
            Self::Discharges => "discharges",
            Self::Refuels => "refuels",
            Self::FuelLevels => "fuel_levels",
            Self::Odometer => "odometer",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = UnknownDatasetKind;

    /// Accepts canonical names and the provider's (Russian) table labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zone_visits" | "geozones" | "геозоны" => Ok(Self::ZoneVisits),
            "trips" | "поездки" => Ok(Self::Trips),
            "parkings" | "стоянки" => Ok(Self::Parkings),
            "motohours" | "моточасы" => Ok(Self::Motohours),
            "equipment_on" | "angle_sensor" | "дун" => Ok(Self::EquipmentOn),
            "discharges" | "сливы" => Ok(Self::Discharges),
            "refuels" | "refillings" | "заправки" => Ok(Self::Refuels),
            "fuel_levels" | "fuel_level" | "уровень топлива" => Ok(Self::FuelLevels),
            "odometer" | "пробег" => Ok(Self::Odometer),
            _ => Err(UnknownDatasetKind(s.to_string())),
        }
    }
}

impl Serialize for DatasetKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DatasetKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown dataset names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown dataset kind: {0}")]
pub struct UnknownDatasetKind(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for kind in [
            DatasetKind::ZoneVisits,
            DatasetKind::Trips,
            DatasetKind::Parkings,
            DatasetKind::Motohours,
            DatasetKind::EquipmentOn,
            DatasetKind::Discharges,
            DatasetKind::Refuels,
            DatasetKind::FuelLevels,
            DatasetKind::Odometer,
        ] {
            let parsed: DatasetKind = kind.to_string().parse().expect("should parse");
            assert_eq!(parsed, kind, "roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn provider_labels_parse() {
        assert_eq!(
            "Геозоны".parse::<DatasetKind>().unwrap(),
            DatasetKind::ZoneVisits
        );
        assert_eq!(
            "уровень топлива".parse::<DatasetKind>().unwrap(),
            DatasetKind::FuelLevels
        );
        assert_eq!("ДУН".parse::<DatasetKind>().unwrap(), DatasetKind::EquipmentOn);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = "last_data".parse::<DatasetKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown dataset kind: last_data");
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&DatasetKind::EquipmentOn).unwrap();
        assert_eq!(json, "\"equipment_on\"");
        let parsed: DatasetKind = serde_json::from_str("\"refillings\"").unwrap();
        assert_eq!(parsed, DatasetKind::Refuels);
    }
}

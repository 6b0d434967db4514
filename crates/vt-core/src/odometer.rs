//! Cumulative distance from raw position pings.

use crate::rows::{MomentRow, PositionPing};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// One odometer reading per ping, carrying the distance travelled since the
/// first ping.
///
/// Pings must be ascending by time.
pub fn build_odometer(pings: &[PositionPing]) -> Vec<MomentRow> {
    let mut total = 0.0;
    let mut previous: Option<&PositionPing> = None;

    pings
        .iter()
        .map(|ping| {
            if let Some(prev) = previous {
                total += haversine_km(prev.lat, prev.lon, ping.lat, ping.lon);
            }
            previous = Some(ping);
            MomentRow::new(ping.at, total)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ping(t: i64, lat: f64, lon: f64) -> PositionPing {
        PositionPing {
            at: DateTime::<Utc>::from_timestamp(t, 0).unwrap(),
            lat,
            lon,
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let rows = build_odometer(&[ping(0, 0.0, 0.0), ping(60, 0.0, 1.0)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, Some(0.0));
        let km = rows[1].value.unwrap();
        assert!((km - 111.19).abs() < 0.5, "got {km}");
    }

    #[test]
    fn distance_accumulates() {
        let rows = build_odometer(&[
            ping(0, 55.75, 37.61),
            ping(60, 55.76, 37.61),
            ping(120, 55.76, 37.61),
            ping(180, 55.75, 37.61),
        ]);
        let values: Vec<f64> = rows.iter().map(|r| r.value.unwrap()).collect();
        assert!(values.windows(2).all(|w| w[1] >= w[0]));
        assert!((values[1] - values[2]).abs() < f64::EPSILON);
        assert!((values[3] - 2.0 * values[1]).abs() < 1e-9);
    }

    #[test]
    fn no_pings_no_readings() {
        assert!(build_odometer(&[]).is_empty());
    }

    #[test]
    fn haversine_is_symmetric() {
        let there = haversine_km(55.75, 37.61, 59.93, 30.31);
        let back = haversine_km(59.93, 30.31, 55.75, 37.61);
        assert!((there - back).abs() < 1e-9);
        assert!((there - 634.0).abs() < 10.0, "got {there}");
    }
}

//! Routes, shifts and route-membership filtering.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::period::Period;
use crate::rows::normalize_zone_name;
use crate::types::ZoneName;

/// A named zone on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub name: String,
}

/// A catalog route: an ordered list of zones a vehicle is expected to visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub points: Vec<RoutePoint>,
}

impl Route {
    /// True when the route name carries one of the fixed-route markers.
    pub fn is_fixed(&self, markers: &[String]) -> bool {
        let name = self.name.to_lowercase();
        markers
            .iter()
            .any(|marker| !marker.is_empty() && name.contains(&marker.to_lowercase()))
    }
}

/// A shift (job) assigned to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub unit_id: u64,
    pub route_id: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Read access to the route/geofence catalog.
pub trait RouteCatalog {
    fn routes(&self) -> &[Route];

    fn route(&self, id: u64) -> Option<&Route> {
        self.routes().iter().find(|route| route.id == id)
    }

    /// The first route whose name marks it as fixed.
    fn fallback_route(&self, markers: &[String]) -> Option<&Route> {
        self.routes().iter().find(|route| route.is_fixed(markers))
    }
}

impl RouteCatalog for Vec<Route> {
    fn routes(&self) -> &[Route] {
        self
    }
}

/// Read access to shift assignments.
pub trait ShiftStore {
    fn shift_for(&self, unit_id: u64) -> Option<Shift>;
}

impl ShiftStore for Vec<Shift> {
    fn shift_for(&self, unit_id: u64) -> Option<Shift> {
        self.iter().find(|shift| shift.unit_id == unit_id).cloned()
    }
}

/// Which zone rows take part in reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFilter {
    /// Fixed or fallback route: every zone counts.
    AcceptAll,
    /// Only zones whose normalized name is a route point.
    Points(HashSet<ZoneName>),
}

impl RouteFilter {
    pub fn accepts(&self, zone: &ZoneName) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::Points(points) => points.contains(zone),
        }
    }
}

/// The route a unit is reconstructed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route_name: Option<String>,
    pub filter: RouteFilter,
    /// Shift bounds; zone rows outside them are ignored.
    pub shift_window: Option<Period>,
}

/// Why a unit's route could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteUnresolved {
    #[error("route {route_id} is not in the catalog and no fixed route exists")]
    UnknownRoute { route_id: u64 },

    #[error("route {route_id} ({name}) has no zone points")]
    NoPoints { route_id: u64, name: String },
}

/// Resolves the route filter for a unit's shift.
///
/// Units without a shift, shifts on fixed routes, and shifts whose route is
/// missing while a fixed route exists all accept every zone.
pub fn resolve_route<C: RouteCatalog + ?Sized>(
    shift: Option<&Shift>,
    catalog: &C,
    fixed_markers: &[String],
) -> Result<ResolvedRoute, RouteUnresolved> {
    let Some(shift) = shift else {
        return Ok(ResolvedRoute {
            route_name: catalog.fallback_route(fixed_markers).map(|r| r.name.clone()),
            filter: RouteFilter::AcceptAll,
            shift_window: None,
        });
    };

    let Some(route) = catalog.route(shift.route_id) else {
        let fallback = catalog
            .fallback_route(fixed_markers)
            .ok_or(RouteUnresolved::UnknownRoute {
                route_id: shift.route_id,
            })?;
        return Ok(ResolvedRoute {
            route_name: Some(fallback.name.clone()),
            filter: RouteFilter::AcceptAll,
            shift_window: None,
        });
    };

    if route.is_fixed(fixed_markers) {
        return Ok(ResolvedRoute {
            route_name: Some(route.name.clone()),
            filter: RouteFilter::AcceptAll,
            shift_window: None,
        });
    }

    let points: HashSet<ZoneName> = route
        .points
        .iter()
        .filter_map(|point| ZoneName::new(normalize_zone_name(&point.name)).ok())
        .collect();
    if points.is_empty() {
        return Err(RouteUnresolved::NoPoints {
            route_id: route.id,
            name: route.name.clone(),
        });
    }

    Ok(ResolvedRoute {
        route_name: Some(route.name.clone()),
        filter: RouteFilter::Points(points),
        shift_window: Some(Period::new(shift.begin, shift.end)),
    })
}

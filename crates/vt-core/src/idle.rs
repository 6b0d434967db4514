//! Idle engine time: motohours not explained by trips or equipment work.

use crate::period::{Period, merge_periods};
use crate::visit::Visit;

/// How a work interval relates to a remaining engine-on sub-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    Disjoint,
    /// Work covers the whole sub-period; `exact` when the bounds coincide.
    Covers { exact: bool },
    /// Work lies inside the sub-period and shares its start.
    InsideAtStart,
    /// Work lies inside the sub-period and shares its end.
    InsideAtEnd,
    /// Work lies strictly inside the sub-period.
    Inside,
    /// Work overlaps the sub-period's start and ends inside it.
    OverlapsStart,
    /// Work starts inside the sub-period and runs past its end.
    OverlapsEnd,
}

fn classify(sub: Period, work: Period) -> Overlap {
    if sub.overlap_seconds(&work) <= 0 {
        return Overlap::Disjoint;
    }
    match (work.start <= sub.start, work.end >= sub.end) {
        (true, true) => Overlap::Covers {
            exact: work.start == sub.start && work.end == sub.end,
        },
        (true, false) if work.start == sub.start => Overlap::InsideAtStart,
        (true, false) => Overlap::OverlapsStart,
        (false, true) if work.end == sub.end => Overlap::InsideAtEnd,
        (false, true) => Overlap::OverlapsEnd,
        (false, false) => Overlap::Inside,
    }
}

/// What remains of `sub` once `work` is removed from it.
fn subtract(sub: Period, work: Period) -> Vec<Period> {
    match classify(sub, work) {
        Overlap::Disjoint => vec![sub],
        Overlap::Covers { .. } => Vec::new(),
        Overlap::InsideAtStart | Overlap::OverlapsStart => vec![Period::new(work.end, sub.end)],
        Overlap::InsideAtEnd | Overlap::OverlapsEnd => vec![Period::new(sub.start, work.start)],
        Overlap::Inside => vec![
            Period::new(sub.start, work.start),
            Period::new(work.end, sub.end),
        ],
    }
}

/// Engine-on sub-periods left after removing every work period.
///
/// Each motohour period is reduced independently, building a fresh list of
/// remainders per work period. Processing of a motohour period stops as soon
/// as nothing of it remains.
pub fn idle_periods(motohours: &[Period], work: &[Period]) -> Vec<Period> {
    let work = merge_periods(work.iter().copied());
    let mut idle = Vec::new();

    for motohour in motohours.iter().filter(|p| p.end > p.start) {
        let mut remaining = vec![*motohour];
        for &active in &work {
            remaining = remaining
                .into_iter()
                .flat_map(|sub| subtract(sub, active))
                .collect();
            if remaining.is_empty() {
                break;
            }
        }
        idle.extend(remaining);
    }

    idle
}

/// Fills `idle_periods` and `idle_seconds` on a visit from its attached
/// motohours, trips and equipment-on periods.
pub fn apply_idle(visit: &mut Visit) {
    let motohours: Vec<Period> = visit.motohours.periods.iter().map(|p| p.period()).collect();
    let work: Vec<Period> = visit
        .trips
        .periods
        .iter()
        .chain(&visit.equipment_on.periods)
        .map(|p| p.period())
        .collect();

    let idle = idle_periods(&motohours, &work);
    visit.idle_seconds = idle.iter().map(Period::seconds).sum();
    visit.idle_periods = idle;
}

//! Analyze command: reconstruct and print visit timelines.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use vt_core::{AnalysisContext, FleetReport, TimeWindow, Unit, UnitReport, Visit, analyze_fleet};

use crate::commands::util::{format_duration, parse_window};
use crate::config::Config;
use crate::source::FileSource;

/// Runs every unit in the report file (or just `unit_name`) over `window`.
pub fn analyze_file(
    config: &Config,
    input: &Path,
    window: TimeWindow,
    unit_name: Option<&str>,
) -> Result<FleetReport> {
    let source = FileSource::open(input)?;

    let units: Vec<Unit> = match unit_name {
        Some(name) => {
            let selected: Vec<Unit> = source
                .units
                .iter()
                .filter(|unit| unit.name.as_str() == name)
                .cloned()
                .collect();
            if selected.is_empty() {
                anyhow::bail!("no unit named {name} in {}", input.display());
            }
            selected
        }
        None => source.units.clone(),
    };

    let ctx = AnalysisContext {
        catalog: &source.routes,
        window,
        config: &config.analysis,
        offset: config.offset()?,
    };
    tracing::debug!(units = units.len(), %window, "analysing report file");

    analyze_fleet(&ctx, &source, &source.shifts, &units).context("failed to open report source")
}

fn write_visit(output: &mut String, visit: &Visit) -> std::fmt::Result {
    write!(
        output,
        "  {}–{}  {:<12} {:>7}  idle {:>6}  {:>6.1} km",
        visit.entry.format("%H:%M"),
        visit.exit.format("%H:%M"),
        visit.zone.as_str(),
        format_duration(visit.duration_seconds()),
        format_duration(visit.idle_seconds),
        visit.total_distance,
    )?;
    if let Some(delta) = visit.fuel_delta() {
        write!(output, "  fuel {delta:+.1}")?;
    }
    if visit.refuels.volume > 0.0 {
        write!(output, "  refuel {:.1}", visit.refuels.volume)?;
    }
    if visit.discharges.volume > 0.0 {
        write!(output, "  drain {:.1}", visit.discharges.volume)?;
    }
    writeln!(output)
}

fn write_unit(output: &mut String, report: &UnitReport) -> std::fmt::Result {
    write!(output, "UNIT {}", report.unit.name)?;
    if let Some(route) = &report.route_name {
        write!(output, "  route: {route}")?;
    }
    writeln!(output)?;
    writeln!(output, "Window: {} UTC", report.window)?;

    for visit in &report.visits {
        write_visit(output, visit)?;
    }

    writeln!(
        output,
        "  Total: {} visits, idle {}, {:.1} km",
        report.visits.len(),
        format_duration(report.idle_seconds()),
        report.total_distance(),
    )
}

/// Formats a fleet report as human-readable text.
pub fn format_fleet(fleet: &FleetReport) -> Result<String> {
    let mut output = String::new();

    for report in &fleet.analysed {
        write_unit(&mut output, report)?;
        writeln!(output)?;
    }

    writeln!(output, "SUMMARY")?;
    writeln!(output, "───────")?;
    writeln!(
        output,
        "Analysed: {}  Skipped: {}  Failed: {}",
        fleet.analysed.len(),
        fleet.skipped.len(),
        fleet.failed.len()
    )?;
    for (title, issues) in [("Skipped", &fleet.skipped), ("Failed", &fleet.failed)] {
        if issues.is_empty() {
            continue;
        }
        writeln!(output, "{title}:")?;
        for issue in issues {
            writeln!(output, "  {}: {}", issue.unit.name, issue.reason)?;
        }
    }

    Ok(output)
}

/// Formats a fleet report as JSON.
pub fn format_fleet_json(fleet: &FleetReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(fleet)?)
}

/// Runs the analyze command.
pub fn run(
    config: &Config,
    input: &Path,
    from: &str,
    to: &str,
    unit_name: Option<&str>,
    json: bool,
) -> Result<()> {
    let window = parse_window(from, to, config.offset()?)?;
    let fleet = analyze_file(config, input, window, unit_name)?;

    if json {
        let output = format_fleet_json(&fleet)?;
        println!("{output}");
    } else {
        let output = format_fleet(&fleet)?;
        print!("{output}");
    }

    Ok(())
}

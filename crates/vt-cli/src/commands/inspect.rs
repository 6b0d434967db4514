//! Inspect command: row casting statistics per unit and table.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use vt_core::FleetReport;

use crate::commands::analyze::analyze_file;
use crate::commands::util::parse_window;
use crate::config::Config;

/// Formats per-table row counts for every analysed unit.
pub fn format_inspection(fleet: &FleetReport) -> Result<String> {
    let mut output = String::new();

    for report in &fleet.analysed {
        writeln!(output, "UNIT {}", report.unit.name)?;
        writeln!(
            output,
            "  {:<14} {:>6} {:>8} {:>8}  order",
            "table", "rows", "dropped", "unknown"
        )?;
        for stats in report.stats() {
            writeln!(
                output,
                "  {:<14} {:>6} {:>8} {:>8}  {}",
                stats.kind.as_str(),
                stats.rows,
                stats.dropped,
                stats.placeholders,
                if stats.reordered { "sorted" } else { "ok" }
            )?;
        }
        writeln!(output)?;
    }

    for issue in fleet.skipped.iter().chain(&fleet.failed) {
        writeln!(output, "UNIT {}: {}", issue.unit.name, issue.reason)?;
    }

    Ok(output)
}

/// Runs the inspect command.
pub fn run(config: &Config, input: &Path, from: &str, to: &str) -> Result<()> {
    let window = parse_window(from, to, config.offset()?)?;
    let fleet = analyze_file(config, input, window, None)?;
    print!("{}", format_inspection(&fleet)?);
    Ok(())
}
